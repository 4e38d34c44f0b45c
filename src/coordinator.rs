//! Periodic refresh of sale data with listener notification.
//!
//! The coordinator owns one [`Fetcher`], refreshes it on a fixed interval and
//! hands every successful result to the registered listeners. A failed
//! refresh keeps the previous data and notifies nobody.

use crate::eshop::{EshopApi, EshopResults, Fetcher, SwitchGame};
use crate::filters::Wishlist;
use anyhow::Result;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

type Listener = Arc<dyn Fn(&EshopResults) + Send + Sync>;

/// Handle returned by [`Coordinator::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Wishlist games currently on sale for one wishlist entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TermStatus {
    pub term: String,
    pub matches: Vec<SwitchGame>,
}

impl TermStatus {
    pub fn is_on_sale(&self) -> bool {
        !self.matches.is_empty()
    }
}

/// Games in `results` whose title starts with `term`, ignoring case.
pub fn matches_for(results: &EshopResults, term: &str) -> Vec<SwitchGame> {
    let term = term.to_lowercase();
    results.values().filter(|g| g.title.to_lowercase().starts_with(&term)).cloned().collect()
}

/// Per-entry view of `results`, in wishlist order.
pub fn term_statuses(wishlist: &Wishlist, results: &EshopResults) -> Vec<TermStatus> {
    wishlist
        .terms()
        .iter()
        .map(|term| TermStatus { term: term.clone(), matches: matches_for(results, term) })
        .collect()
}

pub struct Coordinator<C> {
    fetcher: Fetcher<C>,
    interval: Duration,
    data: RwLock<Arc<EshopResults>>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
    last_update_success: AtomicBool,
    refreshing: tokio::sync::Mutex<()>,
}

impl<C: EshopApi> Coordinator<C> {
    pub fn new(fetcher: Fetcher<C>, interval: Duration) -> Self {
        Self {
            fetcher,
            interval,
            data: RwLock::new(Arc::new(EshopResults::new())),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            last_update_success: AtomicBool::new(false),
            refreshing: tokio::sync::Mutex::new(()),
        }
    }

    pub fn fetcher(&self) -> &Fetcher<C> {
        &self.fetcher
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Registers a callback run after every successful refresh.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&EshopResults) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.lock_listeners().push((id, Arc::new(listener)));
        debug!("Added listener {:?}", id);
        id
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.lock_listeners().len()
    }

    /// Result of the last successful refresh; empty before the first one.
    pub fn data(&self) -> Arc<EshopResults> {
        match self.data.read() {
            Ok(data) => Arc::clone(&data),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Whether the most recent refresh succeeded.
    pub fn last_update_success(&self) -> bool {
        self.last_update_success.load(Ordering::Relaxed)
    }

    /// Games in the current data whose title starts with `term`, ignoring case.
    pub fn matches_for(&self, term: &str) -> Vec<SwitchGame> {
        matches_for(&self.data(), term)
    }

    /// Per-entry view of the current data, in wishlist order.
    pub fn term_statuses(&self) -> Vec<TermStatus> {
        term_statuses(self.fetcher.wishlist(), &self.data())
    }

    /// Fetches once. On success stores the result, notifies listeners and
    /// returns the number of games found.
    pub async fn refresh(&self) -> Result<usize> {
        let _guard = self.refreshing.lock().await;

        let games = match self.fetcher.fetch_on_sale().await {
            Ok(games) => games,
            Err(e) => {
                self.last_update_success.store(false, Ordering::Relaxed);
                return Err(e);
            }
        };

        let count = games.len();
        let games = Arc::new(games);
        match self.data.write() {
            Ok(mut data) => *data = Arc::clone(&games),
            Err(poisoned) => *poisoned.into_inner() = Arc::clone(&games),
        }
        self.last_update_success.store(true, Ordering::Relaxed);

        // Listeners run outside the lock so they may add or remove listeners.
        let listeners: Vec<Listener> =
            self.lock_listeners().iter().map(|(_, l)| Arc::clone(l)).collect();
        debug!("Notifying {} listeners", listeners.len());
        for listener in listeners {
            listener(&games);
        }

        Ok(count)
    }

    /// Refreshes immediately and then every interval until `shutdown` resolves.
    /// Failed refreshes are logged; the loop keeps going.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            "Watching {} every {}s",
            self.fetcher.region(),
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = &mut shutdown => break,
                        result = self.refresh() => match result {
                            Ok(count) => debug!("Refresh found {} games", count),
                            Err(e) => error!("Refresh failed: {:#}", e),
                        },
                    }
                }
            }
        }

        info!("Coordinator stopped");
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        self.listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

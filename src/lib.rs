//! eshop-wishlist - Watch the Nintendo eShop for wishlist games on sale
//!
//! Polls the North American search index or the European search and price
//! APIs, keeps the discounted games whose titles match a wishlist, and
//! republishes them on an interval.

pub mod commands;
pub mod config;
pub mod coordinator;
pub mod eshop;
pub mod filters;
pub mod format;

pub use config::Config;
pub use coordinator::{Coordinator, ListenerId, TermStatus};
pub use eshop::{fetch, EshopApi, EshopClient, EshopResults, Fetcher, Price, Region, SwitchGame};
pub use filters::Wishlist;

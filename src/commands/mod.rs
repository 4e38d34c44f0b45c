//! CLI command implementations.

pub mod fetch;
pub mod watch;

pub use fetch::FetchCommand;
pub use watch::WatchCommand;

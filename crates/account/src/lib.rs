//! Account service cache coherency layer.
//!
//! Wraps the customer and authentication repositories with a per-process
//! local cache and a shared cache. Same-key misses are coalesced by a
//! distributed mutex, and writes broadcast invalidations that every
//! replica's [`cache::LocalCacheCleaner`] applies to its local tier.

pub mod cache;
pub mod config;
pub mod state;
pub mod storage;

pub use config::Config;
pub use state::AppState;

//! Cached repository decorators.
//!
//! Each decorator wraps a repository trait with the two-tier cache:
//!
//! - **Reads**: local tier, then shared tier, then a repository fetch
//!   coalesced across replicas by a distributed mutex
//! - **Writes**: persist to the repository, delete from the shared tier,
//!   publish an invalidation for every replica's local tier
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let repo = Arc::new(InMemoryRepository::new());
//! let local = Arc::new(MemoryLocalCache::new(Duration::from_secs(10), 10_000));
//! let shared = Arc::new(MemorySharedCache::new(Duration::from_secs(60), LockOptions::default()));
//!
//! let customers = CachedCustomerRepository::new(repo, local, shared);
//! ```

mod auth;
mod customer;
mod read_through;

#[cfg(all(test, feature = "memory"))]
pub(crate) mod testing;

pub use auth::CachedAuthRepository;
pub use customer::CachedCustomerRepository;
pub use read_through::ReadThrough;

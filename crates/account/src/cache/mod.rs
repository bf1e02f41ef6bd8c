//! Cache tiers and invalidation plumbing.
//!
//! The local tier ([`local`]) is always in-process. The shared tier is
//! selected at compile time:
//!
//! - `memory` (default): in-process shared cache built on tokio primitives
//! - `redis`: Redis via the redis crate
//!
//! These features are mutually exclusive - only one shared cache backend can
//! be enabled at a time.

#[cfg(all(feature = "memory", feature = "redis"))]
compile_error!(
    "Features 'memory' and 'redis' are mutually exclusive. \
    Enable only one shared cache backend at a time."
);

#[cfg(not(any(feature = "memory", feature = "redis")))]
compile_error!(
    "No shared cache backend selected. Enable 'memory' or 'redis' feature. \
    Example: cargo build -p account --no-default-features --features inmemory,redis"
);

pub mod cleaner;
pub mod local;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use cleaner::{CleanerHandle, LocalCacheCleaner};
pub use local::MemoryLocalCache;

#[cfg(feature = "memory")]
pub use memory::MemorySharedCache;

#[cfg(feature = "redis")]
pub use redis_impl::RedisSharedCache;

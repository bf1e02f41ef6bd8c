//! Redis shared cache backend.
//!
//! Provides the shared tier for multi-replica deployments: TTL'd values via
//! a pooled `ConnectionManager`, `SET NX PX` leased locks and a dedicated
//! pub/sub connection per invalidation subscription.

mod cache;
mod error;
mod mutex;
mod pubsub;

pub use cache::RedisSharedCache;
pub use mutex::RedisMutex;

//! In-process shared cache backend.
//!
//! Stands in for Redis when every "replica" lives in one process: tests,
//! local development and single-node deployments. Replicas built around
//! clones of the same [`MemorySharedCache`] see one store, one lock table and
//! one pub/sub bus, exactly as they would with a real shared cache.

mod cache;
mod mutex;
mod pubsub;

pub use cache::MemorySharedCache;
pub use mutex::MemoryMutex;
pub use pubsub::MemoryPubSub;

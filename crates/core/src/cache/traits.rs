use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{InvalidationMessage, Result};

/// Per-process cache tier.
///
/// Implementations hold values for a TTL fixed at construction and must be
/// safe to share between request handlers and the invalidation cleaner.
#[async_trait]
pub trait LocalCache: Send + Sync {
    /// Gets a value by key. `Ok(None)` is an ordinary miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores a value under the tier's TTL.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Evicts a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Evicts every key.
    async fn clear(&self) -> Result<()>;
}

/// A named lock with a lease, shared by every replica.
#[async_trait]
pub trait DistributedMutex: Send + Sync {
    /// The lock name, e.g. `mutex:customer-check:42`.
    fn name(&self) -> &str;

    /// Blocks until the lock is held or the retry budget is spent.
    async fn lock(&self) -> Result<()>;

    /// Releases the lock if this handle still owns it.
    async fn unlock(&self) -> Result<()>;
}

/// Cache tier shared by all replicas.
#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Lock handle type handed out by [`SharedCache::mutex`].
    type Mutex: DistributedMutex + 'static;

    /// Gets a value by key. Transport failures are errors, never `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores a value under the tier's TTL.
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Deletes a key.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Returns an unlocked mutex handle for `name`.
    fn mutex(&self, name: &str) -> Self::Mutex;
}

/// Receiving end of an invalidation subscription.
///
/// The subscription ends (`recv` yields `None`) when the underlying
/// connection is lost. Dropping it unsubscribes.
pub type Subscription = mpsc::Receiver<InvalidationMessage>;

/// Pub/sub transport for invalidation messages.
#[async_trait]
pub trait CachePubSub: Send + Sync {
    /// Publishes a message to every subscriber of `topic`.
    async fn publish(&self, topic: &str, message: &InvalidationMessage) -> Result<()>;

    /// Subscribes to `topic`.
    async fn subscribe(&self, topic: &str) -> Result<Subscription>;
}

/// Combined trait for shared caches that also carry pub/sub.
pub trait FullSharedCache: SharedCache + CachePubSub {}

impl<T: SharedCache + CachePubSub> FullSharedCache for T {}

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use account_core::cache::{
    CachePubSub, InvalidationMessage, LockOptions, Result, SharedCache, Subscription,
};

use super::mutex::{Lease, MemoryMutex};
use super::pubsub::MemoryPubSub;

/// Expired entries are swept from the store once per this many writes.
const SWEEP_EVERY: usize = 256;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-memory shared cache with TTL, leased locks and pub/sub.
#[derive(Debug, Clone)]
pub struct MemorySharedCache {
    store: Arc<RwLock<HashMap<String, CacheEntry>>>,
    locks: Arc<Mutex<HashMap<String, Lease>>>,
    pubsub: MemoryPubSub,
    writes: Arc<AtomicUsize>,
    ttl: Duration,
    lock_options: LockOptions,
}

impl MemorySharedCache {
    /// Creates a shared cache whose entries live for `ttl`.
    pub fn new(ttl: Duration, lock_options: LockOptions) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            locks: Arc::new(Mutex::new(HashMap::new())),
            pubsub: MemoryPubSub::new(),
            writes: Arc::new(AtomicUsize::new(0)),
            ttl,
            lock_options,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Ends every open subscription, as a dropped connection would.
    pub async fn disconnect_subscribers(&self) {
        self.pubsub.disconnect_all().await;
    }

    /// Number of live subscriptions on `topic`.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.pubsub.subscriber_count(topic).await
    }
}

#[async_trait]
impl SharedCache for MemorySharedCache {
    type Mutex = MemoryMutex;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let store = self.store.read().await;
        Ok(store
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut store = self.store.write().await;
        let now = Instant::now();
        if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == 0 {
            store.retain(|_, entry| now < entry.expires_at);
        }
        store.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_vec(),
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.write().await.remove(key);
        Ok(())
    }

    fn mutex(&self, name: &str) -> MemoryMutex {
        MemoryMutex::new(name, Arc::clone(&self.locks), self.lock_options.clone())
    }
}

#[async_trait]
impl CachePubSub for MemorySharedCache {
    async fn publish(&self, topic: &str, message: &InvalidationMessage) -> Result<()> {
        self.pubsub.publish(topic, message).await
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription> {
        self.pubsub.subscribe(topic).await
    }
}

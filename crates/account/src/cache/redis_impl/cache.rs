//! Redis shared cache implementation.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use account_core::cache::{
    CacheError, CachePubSub, InvalidationMessage, LockOptions, Result, SharedCache, Subscription,
};

use super::error::{bounded, map_redis_error};
use super::mutex::RedisMutex;
use super::pubsub;

/// Redis shared cache using a connection manager for pooling.
///
/// Commands share one auto-reconnecting multiplexed connection. Each
/// subscription opens its own pub/sub connection, since a connection in
/// subscriber mode cannot issue regular commands.
pub struct RedisSharedCache {
    client: redis::Client,
    conn: redis::aio::ConnectionManager,
    ttl: Duration,
    lock_options: LockOptions,
    op_timeout: Duration,
}

impl RedisSharedCache {
    /// Connects to Redis.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `ttl` - Lifetime of every cached value
    /// * `lock_options` - Lease and retry parameters for fetch locks
    /// * `op_timeout` - Upper bound for any single Redis round-trip
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the connection cannot be established.
    pub async fn new(
        url: &str,
        ttl: Duration,
        lock_options: LockOptions,
        op_timeout: Duration,
    ) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = redis::aio::ConnectionManager::new(client.clone())
            .await
            .map_err(map_redis_error)?;
        Ok(Self {
            client,
            conn,
            ttl,
            lock_options,
            op_timeout,
        })
    }

    fn ttl_seconds(&self) -> u64 {
        self.ttl.as_secs().max(1)
    }
}

#[async_trait]
impl SharedCache for RedisSharedCache {
    type Mutex = RedisMutex;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        bounded(self.op_timeout, conn.get(key)).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut conn = self.conn.clone();
        bounded(
            self.op_timeout,
            conn.set_ex::<_, _, ()>(key, value, self.ttl_seconds()),
        )
        .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        bounded(self.op_timeout, conn.del::<_, ()>(key)).await
    }

    fn mutex(&self, name: &str) -> RedisMutex {
        RedisMutex::new(
            name,
            self.conn.clone(),
            self.lock_options.clone(),
            self.op_timeout,
        )
    }
}

#[async_trait]
impl CachePubSub for RedisSharedCache {
    async fn publish(&self, topic: &str, message: &InvalidationMessage) -> Result<()> {
        let payload = message.encode()?;
        let mut conn = self.conn.clone();

        bounded(self.op_timeout, conn.publish::<_, _, ()>(topic, payload))
            .await
            .map_err(|e| CacheError::PublishFailed(e.to_string()))
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription> {
        pubsub::subscribe(&self.client, topic, self.op_timeout).await
    }
}

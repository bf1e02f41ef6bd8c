//! The check/lock/re-check sequence shared by every cached read.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use account_core::cache::{
    deserialize, mutex_key, serialize, DistributedMutex, ExistenceMarker, FullSharedCache,
    InvalidationMessage, LocalCache, INVALIDATION_TOPIC,
};
use account_core::storage::{RepositoryError, Result};

/// Two-tier read-through cache with per-key fetch coalescing.
///
/// A read consults the local tier, then the shared tier. On a miss in both
/// it takes the key's distributed mutex, checks the shared tier once more,
/// and only then calls the repository. Concurrent misses of one key, across
/// every replica, therefore produce a single repository fetch.
pub struct ReadThrough<L, S> {
    local: Arc<L>,
    shared: Arc<S>,
}

impl<L, S> ReadThrough<L, S>
where
    L: LocalCache,
    S: FullSharedCache,
{
    pub fn new(local: Arc<L>, shared: Arc<S>) -> Self {
        Self { local, shared }
    }

    /// Reads `key`, calling `fetch` on a true miss.
    ///
    /// Whatever `fetch` returns is cached in both tiers. Cache-tier failures
    /// are logged and fall through to the next tier; fetch errors are
    /// returned without caching anything. Failing to obtain the lock fails
    /// the read.
    pub async fn read<T, F, Fut>(&self, key: &str, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        if let Some(value) = self.get_local(key).await {
            tracing::trace!(%key, "Local cache hit");
            return Ok(value);
        }

        if let Some(value) = self.get_shared(key).await {
            tracing::trace!(%key, "Shared cache hit");
            return Ok(value);
        }

        let guard = LockGuard::acquire(self.shared.mutex(&mutex_key(key)))
            .await
            .map_err(RepositoryError::LockFailed)?;

        // Another holder may have filled the key while we waited.
        if let Some(value) = self.get_shared(key).await {
            tracing::trace!(%key, "Shared cache hit after lock");
            guard.release().await;
            return Ok(value);
        }

        tracing::trace!(%key, "Cache miss, fetching from repository");
        let value = match fetch().await {
            Ok(value) => value,
            Err(err) => {
                guard.release().await;
                return Err(err);
            }
        };

        match serialize(&value) {
            Ok(bytes) => {
                if let Err(err) = self.shared.set(key, &bytes).await {
                    tracing::warn!(%key, error = %err, "Failed to populate shared cache");
                }
                self.set_local(key, &bytes).await;
            }
            Err(err) => tracing::warn!(%key, error = %err, "Failed to serialize cache value"),
        }

        guard.release().await;
        Ok(value)
    }

    /// Like [`ReadThrough::read`], caching "not found" as a marker so that
    /// lookups of absent records are absorbed by the cache too.
    pub async fn read_optional<T, F, Fut>(&self, key: &str, fetch: F) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Option<T>>> + Send,
    {
        let marker: ExistenceMarker<T> = self
            .read(key, || async move { fetch().await.map(ExistenceMarker::from) })
            .await?;
        Ok(marker.into_option())
    }

    /// Deletes `keys` from the shared tier and announces them to every
    /// replica's cleaner in one message.
    ///
    /// Runs after a successful repository write, so failures are logged
    /// rather than returned.
    pub async fn invalidate(&self, keys: Vec<String>) {
        for key in &keys {
            if let Err(err) = self.shared.delete(key).await {
                tracing::warn!(%key, error = %err, "Failed to delete from shared cache");
            }
        }

        let message = InvalidationMessage::new(keys);
        match self.shared.publish(INVALIDATION_TOPIC, &message).await {
            Ok(()) => tracing::debug!(keys = ?message.keys(), "Published cache invalidation"),
            Err(err) => {
                tracing::warn!(keys = ?message.keys(), error = %err, "Failed to publish cache invalidation")
            }
        }
    }

    async fn get_local<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.local.get(key).await {
            Ok(Some(bytes)) => match deserialize(&bytes) {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::warn!(%key, error = %err, "Local cache deserialization failed");
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(%key, error = %err, "Local cache read failed");
                None
            }
        }
    }

    /// Shared-tier lookup that refills the local tier on a hit.
    async fn get_shared<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.shared.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(%key, error = %err, "Shared cache read failed");
                return None;
            }
        };

        match deserialize(&bytes) {
            Ok(value) => {
                self.set_local(key, &bytes).await;
                Some(value)
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, "Shared cache deserialization failed");
                None
            }
        }
    }

    async fn set_local(&self, key: &str, bytes: &[u8]) {
        if let Err(err) = self.local.set(key, bytes).await {
            tracing::warn!(%key, error = %err, "Failed to populate local cache");
        }
    }
}

/// Holds a distributed mutex until released.
///
/// If the owning future is dropped (cancelled or panicking) before
/// [`LockGuard::release`] runs, the unlock is spawned on the runtime instead.
struct LockGuard<M: DistributedMutex + 'static> {
    mutex: Option<M>,
}

impl<M: DistributedMutex + 'static> LockGuard<M> {
    async fn acquire(mutex: M) -> account_core::cache::Result<Self> {
        mutex.lock().await?;
        Ok(Self { mutex: Some(mutex) })
    }

    async fn release(mut self) {
        if let Some(mutex) = self.mutex.take() {
            unlock(mutex).await;
        }
    }
}

impl<M: DistributedMutex + 'static> Drop for LockGuard<M> {
    fn drop(&mut self) {
        let Some(mutex) = self.mutex.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(unlock(mutex));
            }
            Err(_) => {
                tracing::warn!(lock = %mutex.name(), "No runtime to release lock, waiting for lease expiry");
            }
        }
    }
}

async fn unlock<M: DistributedMutex>(mutex: M) {
    if let Err(err) = mutex.unlock().await {
        tracing::warn!(lock = %mutex.name(), error = %err, "Failed to release lock");
    }
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use account_core::cache::{CacheError, CachePubSub, LockOptions, SharedCache};
    use account_core::customer::{CustomerPersonalInfo, CustomerStatus};

    use super::super::testing::{fast_lock_options, CountingSharedCache};
    use crate::cache::local::MemoryLocalCache;
    use crate::cache::memory::MemorySharedCache;

    const KEY: &str = "customer-personal-info:42";

    fn setup(
        options: LockOptions,
    ) -> (
        Arc<MemoryLocalCache>,
        Arc<CountingSharedCache>,
        ReadThrough<MemoryLocalCache, CountingSharedCache>,
    ) {
        let local = Arc::new(MemoryLocalCache::new(Duration::from_secs(10), 100));
        let shared = Arc::new(CountingSharedCache::new(MemorySharedCache::new(
            Duration::from_secs(60),
            options,
        )));
        let cache = ReadThrough::new(Arc::clone(&local), Arc::clone(&shared));
        (local, shared, cache)
    }

    async fn never_fetch<T>() -> Result<T> {
        panic!("repository must not be called")
    }

    fn ming() -> CustomerPersonalInfo {
        CustomerPersonalInfo::new("ming", "hsu", "test@x.com")
    }

    #[tokio::test]
    async fn test_miss_fetches_and_populates_both_tiers() {
        let (local, shared, cache) = setup(LockOptions::default());

        let value = cache
            .read(KEY, || async { Ok(ming()) })
            .await
            .unwrap();

        assert_eq!(value, ming());
        assert!(local.get(KEY).await.unwrap().is_some());
        assert!(shared.inner().get(KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_local_hit_skips_shared_cache() {
        let (local, shared, cache) = setup(LockOptions::default());
        local.set(KEY, &serialize(&ming()).unwrap()).await.unwrap();

        let value: CustomerPersonalInfo = cache
            .read(KEY, never_fetch)
            .await
            .unwrap();

        assert_eq!(value, ming());
        assert_eq!(shared.calls(), 0);
    }

    #[tokio::test]
    async fn test_shared_hit_repopulates_local() {
        let (local, shared, cache) = setup(LockOptions::default());
        shared
            .inner()
            .set(KEY, &serialize(&ming()).unwrap())
            .await
            .unwrap();

        let value: CustomerPersonalInfo = cache
            .read(KEY, never_fetch)
            .await
            .unwrap();

        assert_eq!(value, ming());
        assert_eq!(local.get(KEY).await.unwrap(), Some(serialize(&ming()).unwrap()));
    }

    #[tokio::test]
    async fn test_concurrent_misses_coalesce() {
        let (_, _, cache) = setup(LockOptions::default());
        let cache = Arc::new(cache);
        let fetches = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let fetches = Arc::clone(&fetches);
            handles.push(tokio::spawn(async move {
                cache
                    .read(KEY, || async move {
                        fetches.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(ming())
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), ming());
        }
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_optional_caches_missing_marker() {
        let (_, _, cache) = setup(LockOptions::default());
        let fetches = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Option<CustomerPersonalInfo> = cache
                .read_optional(KEY, || async {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .await
                .unwrap();
            assert!(value.is_none());
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_is_not_cached_and_releases_lock() {
        let (local, shared, cache) = setup(fast_lock_options());

        let result: Result<CustomerStatus> = cache
            .read(KEY, || async {
                Err(RepositoryError::QueryFailed("connection reset".to_string()))
            })
            .await;

        assert_eq!(
            result,
            Err(RepositoryError::QueryFailed("connection reset".to_string()))
        );
        assert!(local.get(KEY).await.unwrap().is_none());
        assert!(shared.inner().get(KEY).await.unwrap().is_none());

        let mutex = shared.mutex(&mutex_key(KEY));
        assert!(mutex.lock().await.is_ok());
        mutex.unlock().await.unwrap();
    }

    #[tokio::test]
    async fn test_lock_failure_fails_read() {
        let (_, shared, cache) = setup(fast_lock_options());
        let holder = shared.mutex(&mutex_key(KEY));
        holder.lock().await.unwrap();

        let result: Result<CustomerStatus> = cache
            .read(KEY, never_fetch)
            .await;

        assert!(matches!(
            result,
            Err(RepositoryError::LockFailed(CacheError::LockNotAcquired { .. }))
        ));
        holder.unlock().await.unwrap();
    }

    #[tokio::test]
    async fn test_shared_read_failure_falls_through() {
        let (_, shared, cache) = setup(LockOptions::default());
        shared.fail_reads(true);

        let value = cache
            .read(KEY, || async { Ok(CustomerStatus::active(true)) })
            .await
            .unwrap();

        assert_eq!(value, CustomerStatus::active(true));
    }

    #[tokio::test]
    async fn test_shared_write_failure_still_returns_value() {
        let (local, shared, cache) = setup(LockOptions::default());
        shared.fail_writes(true);

        let value = cache
            .read(KEY, || async { Ok(ming()) })
            .await
            .unwrap();

        assert_eq!(value, ming());
        assert!(shared.inner().get(KEY).await.unwrap().is_none());
        // The local tier is still filled
        assert_eq!(local.get(KEY).await.unwrap(), Some(serialize(&ming()).unwrap()));
    }

    #[tokio::test]
    async fn test_invalidate_tolerates_failures() {
        let (_, shared, cache) = setup(LockOptions::default());
        let mut subscription = shared.subscribe(INVALIDATION_TOPIC).await.unwrap();
        shared.inner().set("a", b"1").await.unwrap();
        shared.fail_writes(true);

        // Delete fails, publish still goes out
        cache.invalidate(vec!["a".to_string()]).await;
        assert!(shared.inner().get("a").await.unwrap().is_some());
        assert_eq!(subscription.recv().await.unwrap().keys(), ["a"]);

        shared.fail_writes(false);
        shared.fail_publish(true);

        // Publish fails, delete still happens
        cache.invalidate(vec!["a".to_string()]).await;
        assert!(shared.inner().get("a").await.unwrap().is_none());
        assert_eq!(shared.publishes(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_local_entry_is_a_miss() {
        let (local, _, cache) = setup(LockOptions::default());
        local.set(KEY, b"not json").await.unwrap();

        let value = cache
            .read(KEY, || async { Ok(ming()) })
            .await
            .unwrap();

        assert_eq!(value, ming());
        assert_eq!(local.get(KEY).await.unwrap(), Some(serialize(&ming()).unwrap()));
    }

    #[tokio::test]
    async fn test_cancelled_read_releases_lock() {
        let (_, shared, cache) = setup(fast_lock_options());
        let cache = Arc::new(cache);

        let task = tokio::spawn({
            let cache = Arc::clone(&cache);
            async move {
                cache
                    .read(KEY, || async {
                        std::future::pending::<()>().await;
                        Ok(ming())
                    })
                    .await
            }
        });

        // Let the read take the lock, then cancel it
        tokio::time::sleep(Duration::from_millis(20)).await;
        task.abort();
        let _ = task.await;

        let mutex = shared.mutex(&mutex_key(KEY));
        let acquired = tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                if mutex.lock().await.is_ok() {
                    return;
                }
            }
        })
        .await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_invalidate_deletes_and_publishes() {
        let (_, shared, cache) = setup(LockOptions::default());
        let mut subscription = shared.subscribe(INVALIDATION_TOPIC).await.unwrap();
        shared.inner().set("a", b"1").await.unwrap();
        shared.inner().set("b", b"2").await.unwrap();

        cache
            .invalidate(vec!["a".to_string(), "b".to_string()])
            .await;

        assert!(shared.inner().get("a").await.unwrap().is_none());
        assert!(shared.inner().get("b").await.unwrap().is_none());
        assert_eq!(subscription.recv().await.unwrap().keys(), ["a", "b"]);
    }
}

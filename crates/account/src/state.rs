//! Application state and composition root.
//!
//! Builds the repository, both cache tiers, the cached repository
//! decorators and the local cache cleaner from a [`Config`]. The backend
//! combination is chosen by feature flags.

use std::sync::Arc;

use tokio::sync::Mutex;

use account_core::cache::FullSharedCache;
use account_core::storage::{AuthRepository, CustomerRepository};

use crate::cache::{CleanerHandle, LocalCacheCleaner, MemoryLocalCache};
use crate::config::Config;
use crate::storage::cached::{CachedAuthRepository, CachedCustomerRepository};

// ============================================================================
// Compile-time feature validation
// ============================================================================

#[cfg(not(feature = "inmemory"))]
compile_error!("Must enable a storage feature: 'inmemory'");

/// Shared application state.
///
/// Cheap to clone; clones share the repositories and the cleaner.
#[derive(Clone)]
pub struct AppState {
    /// Customer profile repository (cached, wraps underlying storage).
    pub customer_repo: Arc<dyn CustomerRepository>,
    /// Authentication repository (cached, wraps underlying storage).
    pub auth_repo: Arc<dyn AuthRepository>,
    /// This process's local cache tier.
    pub local_cache: Arc<MemoryLocalCache>,
    cleaner: Arc<Mutex<Option<CleanerHandle>>>,
}

impl AppState {
    /// Creates one replica over existing storage and shared cache.
    ///
    /// Every call gets its own local cache and cleaner, so several
    /// replicas built from the same backends behave like separate
    /// processes sharing one database and one Redis.
    pub fn with_backends<R, S>(config: &Config, repository: Arc<R>, shared_cache: Arc<S>) -> Self
    where
        R: CustomerRepository + AuthRepository + 'static,
        S: FullSharedCache + 'static,
    {
        let local_cache = Arc::new(MemoryLocalCache::new(
            config.local_cache_ttl(),
            config.local_cache_max_entries,
        ));

        let cleaner = LocalCacheCleaner::new(
            local_cache.clone(),
            shared_cache.clone(),
            config.cleaner_retry_delay(),
        )
        .spawn();

        let customer_repo = Arc::new(CachedCustomerRepository::new(
            repository.clone(),
            local_cache.clone(),
            shared_cache.clone(),
        ));
        let auth_repo = Arc::new(CachedAuthRepository::new(
            repository,
            local_cache.clone(),
            shared_cache,
        ));

        Self {
            customer_repo,
            auth_repo,
            local_cache,
            cleaner: Arc::new(Mutex::new(Some(cleaner))),
        }
    }

    /// Stops the local cache cleaner, releasing its subscription.
    ///
    /// Calling this more than once is a no-op.
    pub async fn shutdown(&self) {
        let cleaner = self.cleaner.lock().await.take();
        if let Some(cleaner) = cleaner {
            cleaner.stop().await;
            tracing::info!("Cache layer shut down");
        }
    }
}

// ============================================================================
// Factory functions for different backend combinations
// ============================================================================

#[cfg(all(feature = "inmemory", feature = "memory"))]
mod inmemory_memory {
    use super::*;
    use crate::cache::MemorySharedCache;
    use crate::storage::InMemoryRepository;

    impl AppState {
        /// Creates AppState with in-memory storage and shared cache.
        /// Useful for development without any external dependencies.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            let shared_cache = Arc::new(MemorySharedCache::new(
                config.shared_cache_ttl(),
                config.lock_options(),
            ));
            Ok(Self::with_backends(
                config,
                Arc::new(InMemoryRepository::new()),
                shared_cache,
            ))
        }
    }
}

#[cfg(all(feature = "inmemory", feature = "redis"))]
mod inmemory_redis {
    use super::*;
    use crate::cache::RedisSharedCache;
    use crate::storage::InMemoryRepository;

    impl AppState {
        /// Creates AppState with in-memory storage and a Redis shared cache.
        pub async fn new(config: &Config) -> Result<Self, anyhow::Error> {
            let shared_cache = Arc::new(
                RedisSharedCache::new(
                    &config.redis_url,
                    config.shared_cache_ttl(),
                    config.lock_options(),
                    config.redis_operation_timeout(),
                )
                .await?,
            );
            tracing::info!(redis_url = %config.redis_url, "Connected to Redis shared cache");
            Ok(Self::with_backends(
                config,
                Arc::new(InMemoryRepository::new()),
                shared_cache,
            ))
        }
    }
}

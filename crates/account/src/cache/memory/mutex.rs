use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;

use account_core::cache::{CacheError, DistributedMutex, LockOptions, Result};

/// Source of per-handle ownership tokens.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// A held lock: who owns it and until when.
#[derive(Debug, Clone)]
pub(super) struct Lease {
    token: u64,
    expires_at: Instant,
}

/// Leased lock over the in-memory lock table.
///
/// Mirrors the Redis `SET NX PX` semantics: acquisition succeeds if the name
/// is free or its lease ran out, and only the owning handle can release it.
#[derive(Debug)]
pub struct MemoryMutex {
    name: String,
    token: u64,
    locks: Arc<Mutex<HashMap<String, Lease>>>,
    options: LockOptions,
}

impl MemoryMutex {
    pub(super) fn new(
        name: &str,
        locks: Arc<Mutex<HashMap<String, Lease>>>,
        options: LockOptions,
    ) -> Self {
        Self {
            name: name.to_string(),
            token: NEXT_TOKEN.fetch_add(1, Ordering::Relaxed),
            locks,
            options,
        }
    }

    async fn try_acquire(&self) -> bool {
        let mut locks = self.locks.lock().await;
        let now = Instant::now();
        match locks.get(&self.name) {
            Some(lease) if lease.expires_at > now => false,
            _ => {
                locks.insert(
                    self.name.clone(),
                    Lease {
                        token: self.token,
                        expires_at: now + self.options.lease,
                    },
                );
                true
            }
        }
    }
}

#[async_trait]
impl DistributedMutex for MemoryMutex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lock(&self) -> Result<()> {
        for attempt in 1..=self.options.max_tries {
            if self.try_acquire().await {
                return Ok(());
            }
            if attempt < self.options.max_tries {
                tokio::time::sleep(self.options.retry_delay()).await;
            }
        }
        Err(CacheError::LockNotAcquired {
            name: self.name.clone(),
            tries: self.options.max_tries,
        })
    }

    async fn unlock(&self) -> Result<()> {
        let mut locks = self.locks.lock().await;
        if locks
            .get(&self.name)
            .is_some_and(|lease| lease.token == self.token)
        {
            locks.remove(&self.name);
        }
        Ok(())
    }
}

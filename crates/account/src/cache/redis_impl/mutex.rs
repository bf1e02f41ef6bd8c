//! Leased Redis lock.
//!
//! Acquire is `SET name token NX PX lease`; release deletes the key only if
//! it still holds this handle's token, so a holder whose lease expired can
//! never release a lock that now belongs to someone else.
//!
//! A timed-out acquire may still land on the server after the caller gave
//! up, so it is followed by a background release of the same token.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use uuid::Uuid;

use account_core::cache::{CacheError, DistributedMutex, LockOptions, Result};

use super::error::bounded;

/// Compare-and-delete, executed atomically by Redis.
const UNLOCK_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Distributed mutex handle backed by a single Redis key.
pub struct RedisMutex {
    name: String,
    token: String,
    conn: ConnectionManager,
    options: LockOptions,
    op_timeout: Duration,
}

/// Runs the compare-and-delete for `token`, returning how many keys it removed.
async fn release(
    conn: &mut ConnectionManager,
    name: &str,
    token: &str,
    timeout: Duration,
) -> Result<i64> {
    let script = redis::Script::new(UNLOCK_SCRIPT);
    let released = bounded(timeout, script.key(name).arg(token).invoke_async(conn)).await;
    released
}

impl RedisMutex {
    pub(super) fn new(
        name: &str,
        conn: ConnectionManager,
        options: LockOptions,
        op_timeout: Duration,
    ) -> Self {
        Self {
            name: name.to_string(),
            token: Uuid::new_v4().to_string(),
            conn,
            options,
            op_timeout,
        }
    }

    async fn try_acquire(&self) -> Result<bool> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = bounded(
            self.op_timeout,
            redis::cmd("SET")
                .arg(&self.name)
                .arg(&self.token)
                .arg("NX")
                .arg("PX")
                .arg(self.options.lease_millis())
                .query_async(&mut conn),
        )
        .await?;
        Ok(reply.is_some())
    }

    /// Releases a lock this handle may or may not have taken, off the caller's path.
    fn release_in_background(&self) {
        let name = self.name.clone();
        let token = self.token.clone();
        let mut conn = self.conn.clone();
        let timeout = self.options.lease;
        tokio::spawn(async move {
            match release(&mut conn, &name, &token, timeout).await {
                Ok(1) => tracing::debug!(lock = %name, "Released lock left by a timed-out acquire"),
                Ok(_) => {}
                Err(e) => tracing::warn!(lock = %name, error = %e, "Release after timed-out acquire failed"),
            }
        });
    }
}

#[async_trait]
impl DistributedMutex for RedisMutex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lock(&self) -> Result<()> {
        for attempt in 1..=self.options.max_tries {
            match self.try_acquire().await {
                Ok(true) => {
                    tracing::trace!(lock = %self.name, attempt, "Lock acquired");
                    return Ok(());
                }
                Ok(false) => {}
                Err(err @ CacheError::Timeout(_)) => {
                    self.release_in_background();
                    return Err(err);
                }
                Err(err) => return Err(err),
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
        let mut conn = self.conn.clone();
        let released = release(&mut conn, &self.name, &self.token, self.op_timeout).await?;
        if released == 0 {
            tracing::warn!(lock = %self.name, "Lock lease expired before release");
        }
        Ok(())
    }
}

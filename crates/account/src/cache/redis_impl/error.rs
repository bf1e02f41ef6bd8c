//! Redis error mapping to CacheError.

use std::future::Future;
use std::time::Duration;

use account_core::cache::{CacheError, Result};

/// Maps Redis errors to CacheError.
pub fn map_redis_error(err: redis::RedisError) -> CacheError {
    if err.is_connection_refusal() || err.is_timeout() || err.is_connection_dropped() {
        CacheError::ConnectionFailed(err.to_string())
    } else {
        CacheError::OperationFailed(err.to_string())
    }
}

/// Runs one Redis round-trip under the operation timeout.
pub async fn bounded<T, F>(timeout: Duration, operation: F) -> Result<T>
where
    F: Future<Output = redis::RedisResult<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result.map_err(map_redis_error),
        Err(_) => Err(CacheError::Timeout(timeout.as_millis() as u64)),
    }
}

use std::{env, str::FromStr, time::Duration};

use account_core::cache::LockOptions;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Local cache TTL in seconds (default: 10)
    pub local_cache_ttl_seconds: u64,
    /// Shared cache TTL in seconds (default: 60)
    pub shared_cache_ttl_seconds: u64,
    /// Maximum number of local cache entries (default: 10,000)
    pub local_cache_max_entries: usize,
    /// Redis connection URL (default: "redis://localhost:6379")
    /// Note: Only used when the `redis` feature is enabled.
    pub redis_url: String,
    /// Bound on each Redis command in milliseconds (default: 500)
    pub redis_operation_timeout_ms: u64,
    /// Fetch lock lease in milliseconds (default: 8,000)
    pub lock_lease_ms: u64,
    /// Fetch lock acquisition attempts (default: 32)
    pub lock_max_tries: u32,
    /// Delay before the cleaner resubscribes, in milliseconds (default: 1,000)
    pub cleaner_retry_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `LOCAL_CACHE_TTL_SECONDS` - Local cache TTL in seconds (default: 10)
    /// - `SHARED_CACHE_TTL_SECONDS` - Shared cache TTL in seconds (default: 60)
    /// - `LOCAL_CACHE_MAX_ENTRIES` - Local cache capacity (default: 10,000)
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_OPERATION_TIMEOUT_MS` - Per-command timeout (default: 500)
    /// - `LOCK_LEASE_MS` - Fetch lock lease (default: 8,000)
    /// - `LOCK_MAX_TRIES` - Fetch lock attempts (default: 32)
    /// - `CLEANER_RETRY_DELAY_MS` - Cleaner resubscribe delay (default: 1,000)
    ///
    /// Unset or unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            local_cache_ttl_seconds: parse_or(&lookup, "LOCAL_CACHE_TTL_SECONDS", 10),
            shared_cache_ttl_seconds: parse_or(&lookup, "SHARED_CACHE_TTL_SECONDS", 60),
            local_cache_max_entries: parse_or(&lookup, "LOCAL_CACHE_MAX_ENTRIES", 10_000),
            redis_url: lookup("REDIS_URL")
                .unwrap_or_else(|| "redis://localhost:6379".to_string()),
            redis_operation_timeout_ms: parse_or(&lookup, "REDIS_OPERATION_TIMEOUT_MS", 500),
            lock_lease_ms: parse_or(&lookup, "LOCK_LEASE_MS", 8_000),
            lock_max_tries: parse_or(&lookup, "LOCK_MAX_TRIES", 32),
            cleaner_retry_delay_ms: parse_or(&lookup, "CLEANER_RETRY_DELAY_MS", 1_000),
        }
    }

    pub fn local_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.local_cache_ttl_seconds)
    }

    pub fn shared_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.shared_cache_ttl_seconds)
    }

    pub fn redis_operation_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_operation_timeout_ms)
    }

    pub fn cleaner_retry_delay(&self) -> Duration {
        Duration::from_millis(self.cleaner_retry_delay_ms)
    }

    /// Lock settings for the fetch mutex; retry jitter keeps its defaults.
    pub fn lock_options(&self) -> LockOptions {
        LockOptions::default()
            .with_lease(Duration::from_millis(self.lock_lease_ms))
            .with_max_tries(self.lock_max_tries)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = config_from(&[]);

        assert_eq!(config.local_cache_ttl_seconds, 10);
        assert_eq!(config.shared_cache_ttl_seconds, 60);
        assert_eq!(config.local_cache_max_entries, 10_000);
        assert_eq!(config.redis_url, "redis://localhost:6379");
        assert_eq!(config.redis_operation_timeout_ms, 500);
        assert_eq!(config.lock_lease_ms, 8_000);
        assert_eq!(config.lock_max_tries, 32);
        assert_eq!(config.cleaner_retry_delay_ms, 1_000);
    }

    #[test]
    fn test_values_from_environment() {
        let config = config_from(&[
            ("LOCAL_CACHE_TTL_SECONDS", "5"),
            ("SHARED_CACHE_TTL_SECONDS", "120"),
            ("REDIS_URL", "redis://cache:6380"),
            ("LOCK_MAX_TRIES", " 4 "),
        ]);

        assert_eq!(config.local_cache_ttl(), Duration::from_secs(5));
        assert_eq!(config.shared_cache_ttl(), Duration::from_secs(120));
        assert_eq!(config.redis_url, "redis://cache:6380");
        assert_eq!(config.lock_max_tries, 4);
    }

    #[test]
    fn test_unparsable_value_falls_back() {
        let config = config_from(&[("SHARED_CACHE_TTL_SECONDS", "one minute")]);
        assert_eq!(config.shared_cache_ttl_seconds, 60);
    }

    #[test]
    fn test_duration_conversions() {
        let config = config_from(&[
            ("REDIS_OPERATION_TIMEOUT_MS", "250"),
            ("CLEANER_RETRY_DELAY_MS", "2000"),
        ]);

        assert_eq!(config.redis_operation_timeout(), Duration::from_millis(250));
        assert_eq!(config.cleaner_retry_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_lock_options() {
        let options = config_from(&[("LOCK_LEASE_MS", "3000"), ("LOCK_MAX_TRIES", "8")])
            .lock_options();

        assert_eq!(options.lease, Duration::from_secs(3));
        assert_eq!(options.max_tries, 8);
    }
}

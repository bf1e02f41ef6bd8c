/// Namespace for cached customer personal info, keyed by customer ID.
pub const PERSONAL_INFO_PREFIX: &str = "customer-personal-info:";
/// Namespace for cached customer shipping info, keyed by customer ID.
pub const SHIPPING_INFO_PREFIX: &str = "customer-shipping-info:";
/// Namespace for cached existence/active checks, keyed by customer ID.
pub const CUSTOMER_CHECK_PREFIX: &str = "customer-check:";
/// Namespace for cached credentials, keyed by email.
pub const CREDENTIALS_PREFIX: &str = "customer-credentials:";
/// Namespace for distributed locks guarding a cache key.
pub const MUTEX_PREFIX: &str = "mutex:";

/// The pub/sub topic every replica listens on for stale keys.
pub const INVALIDATION_TOPIC: &str = "invalidate_cache:account";

/// Returns the cache key for a customer's personal info.
pub fn personal_info_key(customer_id: u64) -> String {
    format!("{}{}", PERSONAL_INFO_PREFIX, customer_id)
}

/// Returns the cache key for a customer's shipping info.
pub fn shipping_info_key(customer_id: u64) -> String {
    format!("{}{}", SHIPPING_INFO_PREFIX, customer_id)
}

/// Returns the cache key for a customer's existence/active check.
pub fn customer_check_key(customer_id: u64) -> String {
    format!("{}{}", CUSTOMER_CHECK_PREFIX, customer_id)
}

/// Returns the cache key for the credentials registered under an email.
pub fn credentials_key(email: &str) -> String {
    format!("{}{}", CREDENTIALS_PREFIX, email)
}

/// Returns the lock name protecting fetches of `cache_key`.
///
/// # Examples
///
/// ```
/// use account_core::cache::{mutex_key, personal_info_key};
///
/// assert_eq!(
///     mutex_key(&personal_info_key(42)),
///     "mutex:customer-personal-info:42"
/// );
/// ```
pub fn mutex_key(cache_key: &str) -> String {
    format!("{}{}", MUTEX_PREFIX, cache_key)
}

/// Returns every cache key that describes a single customer.
///
/// Used when a customer is created, since any of these may hold a cached
/// "does not exist" marker from a lookup made before registration.
pub fn customer_keys(customer_id: u64, email: &str) -> Vec<String> {
    vec![
        customer_check_key(customer_id),
        personal_info_key(customer_id),
        shipping_info_key(customer_id),
        credentials_key(email),
    ]
}

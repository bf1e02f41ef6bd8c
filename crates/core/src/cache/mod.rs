mod error;
mod invalidation;
mod keys;
mod lock;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use invalidation::InvalidationMessage;
pub use keys::{
    credentials_key, customer_check_key, customer_keys, mutex_key, personal_info_key,
    shipping_info_key, CREDENTIALS_PREFIX, CUSTOMER_CHECK_PREFIX, INVALIDATION_TOPIC,
    MUTEX_PREFIX, PERSONAL_INFO_PREFIX, SHIPPING_INFO_PREFIX,
};
pub use lock::LockOptions;
pub use serialization::{deserialize, serialize, ExistenceMarker, SerializationError};
pub use traits::{
    CachePubSub, DistributedMutex, FullSharedCache, LocalCache, SharedCache, Subscription,
};

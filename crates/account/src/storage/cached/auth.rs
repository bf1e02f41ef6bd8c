//! Cached authentication repository.

use std::sync::Arc;

use async_trait::async_trait;

use account_core::cache::{
    credentials_key, customer_check_key, customer_keys, FullSharedCache, LocalCache,
};
use account_core::customer::{Customer, CustomerCredentials, CustomerStatus};
use account_core::storage::{AuthRepository, Result};

use super::read_through::ReadThrough;

/// Cache coherency proxy for existence checks and login credentials.
///
/// Check results are cached as-is, since "does not exist" is already a
/// value. Credentials lookups cache unknown emails as missing.
pub struct CachedAuthRepository<R, L, S> {
    repository: Arc<R>,
    cache: ReadThrough<L, S>,
}

impl<R, L, S> CachedAuthRepository<R, L, S>
where
    R: AuthRepository,
    L: LocalCache,
    S: FullSharedCache,
{
    pub fn new(repository: Arc<R>, local: Arc<L>, shared: Arc<S>) -> Self {
        Self {
            repository,
            cache: ReadThrough::new(local, shared),
        }
    }
}

#[async_trait]
impl<R, L, S> AuthRepository for CachedAuthRepository<R, L, S>
where
    R: AuthRepository + 'static,
    L: LocalCache + 'static,
    S: FullSharedCache + 'static,
{
    async fn check_customer(&self, customer_id: u64) -> Result<CustomerStatus> {
        self.cache
            .read(&customer_check_key(customer_id), || {
                self.repository.check_customer(customer_id)
            })
            .await
    }

    async fn create_customer(&self, customer: &Customer) -> Result<()> {
        self.repository.create_customer(customer).await?;

        // Lookups made before registration may have cached the customer as
        // missing under any of its keys.
        self.cache
            .invalidate(customer_keys(customer.id, &customer.personal_info.email))
            .await;

        tracing::debug!(customer_id = customer.id, "Customer created");
        Ok(())
    }

    async fn get_credentials(&self, email: &str) -> Result<Option<CustomerCredentials>> {
        self.cache
            .read_optional(&credentials_key(email), || {
                self.repository.get_credentials(email)
            })
            .await
    }
}

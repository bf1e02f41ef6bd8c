//! Cached customer profile repository.

use std::sync::Arc;

use async_trait::async_trait;

use account_core::cache::{
    credentials_key, personal_info_key, shipping_info_key, FullSharedCache, LocalCache,
};
use account_core::customer::{CustomerPersonalInfo, CustomerShippingInfo};
use account_core::storage::{CustomerRepository, Result};

use super::read_through::ReadThrough;

/// Cache coherency proxy for personal and shipping info.
///
/// - **Reads**: local tier, shared tier, then a coalesced repository fetch.
///   Unknown customers are cached as missing.
/// - **Writes**: persist to the repository, delete the shared entry and
///   publish an invalidation so every replica evicts its local copy.
///
/// # Type Parameters
///
/// * `R` - The underlying repository implementation
/// * `L` - The local cache tier
/// * `S` - The shared cache tier
pub struct CachedCustomerRepository<R, L, S> {
    repository: Arc<R>,
    cache: ReadThrough<L, S>,
}

impl<R, L, S> CachedCustomerRepository<R, L, S>
where
    R: CustomerRepository,
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
impl<R, L, S> CustomerRepository for CachedCustomerRepository<R, L, S>
where
    R: CustomerRepository + 'static,
    L: LocalCache + 'static,
    S: FullSharedCache + 'static,
{
    async fn get_personal_info(&self, customer_id: u64) -> Result<Option<CustomerPersonalInfo>> {
        self.cache
            .read_optional(&personal_info_key(customer_id), || {
                self.repository.get_personal_info(customer_id)
            })
            .await
    }

    async fn get_shipping_info(&self, customer_id: u64) -> Result<Option<CustomerShippingInfo>> {
        self.cache
            .read_optional(&shipping_info_key(customer_id), || {
                self.repository.get_shipping_info(customer_id)
            })
            .await
    }

    async fn update_personal_info(
        &self,
        customer_id: u64,
        personal_info: &CustomerPersonalInfo,
    ) -> Result<()> {
        // 1. Learn the current email, whose login goes away on a change
        let previous = self.repository.get_personal_info(customer_id).await?;

        // 2. Persist to storage
        self.repository
            .update_personal_info(customer_id, personal_info)
            .await?;

        // 3. Invalidate. The new email may have a cached "no such login".
        let mut keys = vec![
            personal_info_key(customer_id),
            credentials_key(&personal_info.email),
        ];
        if let Some(previous) = previous.filter(|p| p.email != personal_info.email) {
            keys.push(credentials_key(&previous.email));
        }
        self.cache.invalidate(keys).await;

        tracing::debug!(customer_id, "Personal info updated");
        Ok(())
    }

    async fn update_shipping_info(
        &self,
        customer_id: u64,
        shipping_info: &CustomerShippingInfo,
    ) -> Result<()> {
        self.repository
            .update_shipping_info(customer_id, shipping_info)
            .await?;

        self.cache
            .invalidate(vec![shipping_info_key(customer_id)])
            .await;

        tracing::debug!(customer_id, "Shipping info updated");
        Ok(())
    }
}

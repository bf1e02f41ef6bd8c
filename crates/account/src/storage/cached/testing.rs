//! Test doubles shared by the cached repository tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use account_core::cache::{
    CacheError, CachePubSub, InvalidationMessage, LockOptions, Result as CacheResult,
    SharedCache, Subscription,
};
use account_core::customer::{
    Customer, CustomerCredentials, CustomerPersonalInfo, CustomerShippingInfo, CustomerStatus,
};
use account_core::storage::{AuthRepository, CustomerRepository, RepositoryError, Result};

use crate::cache::memory::{MemoryMutex, MemorySharedCache};

/// Lock options that give up after a few quick tries.
pub fn fast_lock_options() -> LockOptions {
    LockOptions::default()
        .with_max_tries(3)
        .with_retry_delay(Duration::from_millis(1), Duration::from_millis(2))
}

/// Shared cache wrapper that counts every call and can simulate an outage.
pub struct CountingSharedCache {
    inner: MemorySharedCache,
    calls: AtomicUsize,
    publishes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_publish: AtomicBool,
}

impl CountingSharedCache {
    pub fn new(inner: MemorySharedCache) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            publishes: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_publish: AtomicBool::new(false),
        }
    }

    /// The wrapped cache, for setup and inspection without counting.
    pub fn inner(&self) -> &MemorySharedCache {
        &self.inner
    }

    /// Number of get/set/delete calls made through the wrapper.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn publishes(&self) -> usize {
        self.publishes.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes `set` and `delete` fail.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> CacheResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Timeout(500));
        }
        Ok(())
    }
}

#[async_trait]
impl SharedCache for CountingSharedCache {
    type Mutex = MemoryMutex;

    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::ConnectionFailed("connection refused".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> CacheResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;
        self.inner.delete(key).await
    }

    fn mutex(&self, name: &str) -> MemoryMutex {
        self.inner.mutex(name)
    }
}

#[async_trait]
impl CachePubSub for CountingSharedCache {
    async fn publish(&self, topic: &str, message: &InvalidationMessage) -> CacheResult<()> {
        self.publishes.fetch_add(1, Ordering::SeqCst);
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(CacheError::PublishFailed("connection reset".to_string()));
        }
        self.inner.publish(topic, message).await
    }

    async fn subscribe(&self, topic: &str) -> CacheResult<Subscription> {
        self.inner.subscribe(topic).await
    }
}

/// Repository double that counts reads per operation.
#[derive(Default)]
pub struct MockRepository {
    customers: RwLock<HashMap<u64, Customer>>,
    pub personal_calls: AtomicUsize,
    pub shipping_calls: AtomicUsize,
    pub check_calls: AtomicUsize,
    pub credentials_calls: AtomicUsize,
    failing: AtomicBool,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, customer: Customer) {
        self.customers.write().await.insert(customer.id, customer);
    }

    /// Makes every call fail as if the database were unreachable.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepositoryError::ConnectionFailed(
                "database unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

#[async_trait]
impl CustomerRepository for MockRepository {
    async fn get_personal_info(&self, customer_id: u64) -> Result<Option<CustomerPersonalInfo>> {
        self.personal_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .customers
            .read()
            .await
            .get(&customer_id)
            .map(|c| c.personal_info.clone()))
    }

    async fn get_shipping_info(&self, customer_id: u64) -> Result<Option<CustomerShippingInfo>> {
        self.shipping_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .customers
            .read()
            .await
            .get(&customer_id)
            .map(|c| c.shipping_info.clone()))
    }

    async fn update_personal_info(
        &self,
        customer_id: u64,
        personal_info: &CustomerPersonalInfo,
    ) -> Result<()> {
        self.check_available()?;
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(&customer_id)
            .ok_or_else(|| RepositoryError::customer_not_found(customer_id))?;
        customer.personal_info = personal_info.clone();
        Ok(())
    }

    async fn update_shipping_info(
        &self,
        customer_id: u64,
        shipping_info: &CustomerShippingInfo,
    ) -> Result<()> {
        self.check_available()?;
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(&customer_id)
            .ok_or_else(|| RepositoryError::customer_not_found(customer_id))?;
        customer.shipping_info = shipping_info.clone();
        Ok(())
    }
}

#[async_trait]
impl AuthRepository for MockRepository {
    async fn check_customer(&self, customer_id: u64) -> Result<CustomerStatus> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .customers
            .read()
            .await
            .get(&customer_id)
            .map(Customer::status)
            .unwrap_or_else(CustomerStatus::not_found))
    }

    async fn create_customer(&self, customer: &Customer) -> Result<()> {
        self.check_available()?;
        let mut customers = self.customers.write().await;
        if customers.contains_key(&customer.id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: "Customer",
                id: customer.id.to_string(),
            });
        }
        customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn get_credentials(&self, email: &str) -> Result<Option<CustomerCredentials>> {
        self.credentials_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self
            .customers
            .read()
            .await
            .values()
            .find(|c| c.personal_info.email == email)
            .map(Customer::credentials))
    }
}

//! In-memory repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use account_core::customer::{
    Customer, CustomerCredentials, CustomerPersonalInfo, CustomerShippingInfo, CustomerStatus,
};
use account_core::storage::{AuthRepository, CustomerRepository, RepositoryError, Result};

/// In-memory storage backend.
///
/// Data is not persisted and will be lost when the repository is dropped.
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    customers: Arc<RwLock<HashMap<u64, Customer>>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.customers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.customers.read().await.is_empty()
    }
}

fn duplicate(id: impl ToString) -> RepositoryError {
    RepositoryError::AlreadyExists {
        entity_type: "Customer",
        id: id.to_string(),
    }
}

/// Fails if a customer other than `except` already uses `email`.
fn ensure_email_free(customers: &HashMap<u64, Customer>, email: &str, except: u64) -> Result<()> {
    if customers
        .values()
        .any(|c| c.id != except && c.personal_info.email == email)
    {
        return Err(duplicate(email));
    }
    Ok(())
}

/// Fails if a customer other than `except` already uses `phone_number`.
fn ensure_phone_free(
    customers: &HashMap<u64, Customer>,
    phone_number: &str,
    except: u64,
) -> Result<()> {
    if customers
        .values()
        .any(|c| c.id != except && c.shipping_info.phone_number == phone_number)
    {
        return Err(duplicate(phone_number));
    }
    Ok(())
}

#[async_trait]
impl CustomerRepository for InMemoryRepository {
    async fn get_personal_info(&self, customer_id: u64) -> Result<Option<CustomerPersonalInfo>> {
        let customers = self.customers.read().await;
        Ok(customers.get(&customer_id).map(|c| c.personal_info.clone()))
    }

    async fn get_shipping_info(&self, customer_id: u64) -> Result<Option<CustomerShippingInfo>> {
        let customers = self.customers.read().await;
        Ok(customers.get(&customer_id).map(|c| c.shipping_info.clone()))
    }

    async fn update_personal_info(
        &self,
        customer_id: u64,
        personal_info: &CustomerPersonalInfo,
    ) -> Result<()> {
        let mut customers = self.customers.write().await;
        if !customers.contains_key(&customer_id) {
            return Err(RepositoryError::customer_not_found(customer_id));
        }
        ensure_email_free(&customers, &personal_info.email, customer_id)?;

        if let Some(customer) = customers.get_mut(&customer_id) {
            customer.personal_info = personal_info.clone();
        }
        Ok(())
    }

    async fn update_shipping_info(
        &self,
        customer_id: u64,
        shipping_info: &CustomerShippingInfo,
    ) -> Result<()> {
        let mut customers = self.customers.write().await;
        if !customers.contains_key(&customer_id) {
            return Err(RepositoryError::customer_not_found(customer_id));
        }
        ensure_phone_free(&customers, &shipping_info.phone_number, customer_id)?;

        if let Some(customer) = customers.get_mut(&customer_id) {
            customer.shipping_info = shipping_info.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl AuthRepository for InMemoryRepository {
    async fn check_customer(&self, customer_id: u64) -> Result<CustomerStatus> {
        let customers = self.customers.read().await;
        Ok(customers
            .get(&customer_id)
            .map(Customer::status)
            .unwrap_or_else(CustomerStatus::not_found))
    }

    async fn create_customer(&self, customer: &Customer) -> Result<()> {
        let mut customers = self.customers.write().await;
        if customers.contains_key(&customer.id) {
            return Err(duplicate(customer.id));
        }
        ensure_email_free(&customers, &customer.personal_info.email, customer.id)?;
        ensure_phone_free(&customers, &customer.shipping_info.phone_number, customer.id)?;

        customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn get_credentials(&self, email: &str) -> Result<Option<CustomerCredentials>> {
        let customers = self.customers.read().await;
        Ok(customers
            .values()
            .find(|c| c.personal_info.email == email)
            .map(Customer::credentials))
    }
}

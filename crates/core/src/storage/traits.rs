use async_trait::async_trait;

use crate::customer::{
    Customer, CustomerCredentials, CustomerPersonalInfo, CustomerShippingInfo, CustomerStatus,
};

use super::Result;

/// Repository for customer profile operations.
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Gets a customer's personal info. `Ok(None)` if the customer is unknown.
    async fn get_personal_info(&self, customer_id: u64) -> Result<Option<CustomerPersonalInfo>>;

    /// Gets a customer's shipping info. `Ok(None)` if the customer is unknown.
    async fn get_shipping_info(&self, customer_id: u64) -> Result<Option<CustomerShippingInfo>>;

    /// Replaces a customer's personal info.
    async fn update_personal_info(
        &self,
        customer_id: u64,
        personal_info: &CustomerPersonalInfo,
    ) -> Result<()>;

    /// Replaces a customer's shipping info.
    async fn update_shipping_info(
        &self,
        customer_id: u64,
        shipping_info: &CustomerShippingInfo,
    ) -> Result<()>;
}

/// Repository for authentication lookups.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Reports whether a customer exists and is active.
    async fn check_customer(&self, customer_id: u64) -> Result<CustomerStatus>;

    /// Registers a customer. Fails with `AlreadyExists` if the ID, email or
    /// phone number is taken.
    async fn create_customer(&self, customer: &Customer) -> Result<()>;

    /// Gets the credentials registered under an email, if any.
    async fn get_credentials(&self, email: &str) -> Result<Option<CustomerCredentials>>;
}

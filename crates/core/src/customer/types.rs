use serde::{Deserialize, Serialize};

/// Name and contact email of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerPersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl CustomerPersonalInfo {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
        }
    }
}

/// Where a customer's orders are delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerShippingInfo {
    pub address: String,
    pub phone_number: String,
}

impl CustomerShippingInfo {
    pub fn new(address: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            phone_number: phone_number.into(),
        }
    }
}

/// A customer account as handed to the repository on registration.
///
/// The password arrives already hashed; hashing happens before the
/// repository layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: u64,
    pub active: bool,
    pub password_hash: String,
    pub personal_info: CustomerPersonalInfo,
    pub shipping_info: CustomerShippingInfo,
}

impl Customer {
    /// Creates an active customer.
    pub fn new(
        id: u64,
        password_hash: impl Into<String>,
        personal_info: CustomerPersonalInfo,
        shipping_info: CustomerShippingInfo,
    ) -> Self {
        Self {
            id,
            active: true,
            password_hash: password_hash.into(),
            personal_info,
            shipping_info,
        }
    }

    /// Sets whether the account is active.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// The credentials this customer logs in with.
    pub fn credentials(&self) -> CustomerCredentials {
        CustomerCredentials {
            id: self.id,
            active: self.active,
            password_hash: self.password_hash.clone(),
        }
    }

    pub fn status(&self) -> CustomerStatus {
        CustomerStatus::active(self.active)
    }
}

/// What the login flow needs to verify a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerCredentials {
    pub id: u64,
    pub active: bool,
    pub password_hash: String,
}

/// Result of an existence/active check for a customer ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerStatus {
    pub exists: bool,
    pub active: bool,
}

impl CustomerStatus {
    /// Status of an existing customer.
    pub fn active(active: bool) -> Self {
        Self {
            exists: true,
            active,
        }
    }

    /// Status of an ID with no customer behind it.
    pub fn not_found() -> Self {
        Self {
            exists: false,
            active: false,
        }
    }
}

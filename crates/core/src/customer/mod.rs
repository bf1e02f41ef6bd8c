mod types;

pub use types::{
    Customer, CustomerCredentials, CustomerPersonalInfo, CustomerShippingInfo, CustomerStatus,
};

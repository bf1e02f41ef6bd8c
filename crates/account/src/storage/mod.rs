//! Storage backends and their cached decorators.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): HashMap-backed repository for development and tests

pub mod cached;

#[cfg(feature = "inmemory")]
pub mod inmemory;

pub use cached::{CachedAuthRepository, CachedCustomerRepository};

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryRepository;

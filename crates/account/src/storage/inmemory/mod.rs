//! In-memory storage backend.
//!
//! Keeps customers in a HashMap wrapped in `Arc<RwLock<_>>`. It enforces the
//! same uniqueness rules as the relational store (ID, email, phone number),
//! which makes it usable for development runs as well as tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use account::storage::inmemory::InMemoryRepository;
//!
//! let repo = InMemoryRepository::new();
//! repo.create_customer(&customer).await?;
//! ```

mod repository;

pub use repository::InMemoryRepository;

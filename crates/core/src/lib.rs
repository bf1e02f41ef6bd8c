//! Core types and contracts for the account service.
//!
//! Everything in this crate is backend-agnostic: cache keys, the cache and
//! repository traits, error types and (de)serialization helpers. Concrete
//! backends live in the `account` crate.

pub mod cache;
pub mod customer;
pub mod storage;

//! Pure functions for serializing/deserializing cached values to/from bytes.
//!
//! Values are stored as JSON, which keeps shared cache entries readable from
//! `redis-cli` when debugging.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during cache serialization/deserialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    /// Failed to serialize a value to bytes.
    #[error("Failed to serialize: {0}")]
    SerializeFailed(String),
    /// Failed to deserialize bytes to a value.
    #[error("Failed to deserialize: {0}")]
    DeserializeFailed(String),
}

/// Result type for serialization operations.
pub type Result<T> = std::result::Result<T, SerializationError>;

/// A cached lookup outcome.
///
/// `Missing` records that the repository reported "not found", so repeated
/// lookups of an absent identifier are absorbed by the cache as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistenceMarker<T> {
    Exists(T),
    Missing,
}

impl<T> ExistenceMarker<T> {
    pub fn exists(&self) -> bool {
        matches!(self, ExistenceMarker::Exists(_))
    }

    /// Converts back into the repository's "maybe found" shape.
    pub fn into_option(self) -> Option<T> {
        match self {
            ExistenceMarker::Exists(value) => Some(value),
            ExistenceMarker::Missing => None,
        }
    }
}

impl<T> From<Option<T>> for ExistenceMarker<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => ExistenceMarker::Exists(value),
            None => ExistenceMarker::Missing,
        }
    }
}

/// Serializes a value to JSON bytes.
pub fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Deserializes JSON bytes to a value.
pub fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

use serde::{Deserialize, Serialize};

use super::{CacheError, Result};

/// Keys that became stale, published as one message.
///
/// On the wire this is a bare JSON array of key strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvalidationMessage(Vec<String>);

impl InvalidationMessage {
    /// Creates a message from an ordered list of keys.
    pub fn new(keys: Vec<String>) -> Self {
        Self(keys)
    }

    /// Creates a message announcing a single key.
    pub fn single(key: impl Into<String>) -> Self {
        Self(vec![key.into()])
    }

    /// The announced keys, in publish order.
    pub fn keys(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encodes the message into its wire payload.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CacheError::Serialization(e.to_string()))
    }

    /// Decodes a wire payload.
    pub fn decode(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| CacheError::Serialization(e.to_string()))
    }
}

impl From<Vec<String>> for InvalidationMessage {
    fn from(keys: Vec<String>) -> Self {
        Self::new(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_is_plain_array() {
        let message = InvalidationMessage::new(vec![
            "customer-personal-info:1".to_string(),
            "customer-credentials:a@b.c".to_string(),
        ]);

        assert_eq!(
            message.encode().unwrap(),
            r#"["customer-personal-info:1","customer-credentials:a@b.c"]"#
        );
    }

    #[test]
    fn test_decode_preserves_order() {
        let message = InvalidationMessage::decode(r#"["b","a","c"]"#).unwrap();
        assert_eq!(message.keys(), ["b", "a", "c"]);
    }

    #[test]
    fn test_decode_rejects_envelope() {
        let result = InvalidationMessage::decode(r#"{"keys":["a"]}"#);
        assert!(matches!(result, Err(CacheError::Serialization(_))));
    }

    #[test]
    fn test_single() {
        let message = InvalidationMessage::single("customer-check:9");
        assert_eq!(message.keys(), ["customer-check:9"]);
        assert!(!message.is_empty());
    }
}

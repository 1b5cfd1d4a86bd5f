//! Cache event types and definitions
//!
//! This module defines the structure of cache decision events
//! that flow through the signal system.

use serde::{Deserialize, Serialize};

/// Cache event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    /// Response replayed from the store
    Hit,
    /// Nothing stored, request forwarded to the handler
    Miss,
    /// Method not cacheable, store untouched
    Bypass,
    /// Response written to the store
    Stored,
    /// Store failure or unreadable entry
    Error,
}

/// Cache event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEvent {
    pub event_type: EventType,
    /// HTTP method of the request
    pub method: String,
    /// Path and query of the request
    pub url: String,
    /// Payload key the decision was made on (absent for bypasses)
    pub key: Option<String>,
    /// Expiration applied, for stored entries
    pub ttl: Option<u64>,
    /// Error description, for error events
    pub message: Option<String>,
    /// Event timestamp (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl CacheEvent {
    pub fn new(event_type: EventType, method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            event_type,
            method: method.into(),
            url: url.into(),
            key: None,
            ttl: None,
            message: None,
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// JSON form of the event, for shipping to log sinks
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_fields() {
        let event = CacheEvent::new(EventType::Stored, "GET", "/widgets?id=5")
            .with_key("payload_/widgets?id=5")
            .with_ttl(10);

        assert_eq!(event.event_type, EventType::Stored);
        assert_eq!(event.key.as_deref(), Some("payload_/widgets?id=5"));
        assert_eq!(event.ttl, Some(10));
        assert_eq!(event.message, None);
    }

    #[test]
    fn test_json_shape() {
        let json = CacheEvent::new(EventType::Error, "GET", "/")
            .with_message("boom")
            .to_json();

        assert_eq!(json["event_type"], "Error");
        assert_eq!(json["method"], "GET");
        assert_eq!(json["message"], "boom");
        assert!(json["key"].is_null());
    }
}

//! Error types for cache operations
//!
//! This module defines all error types that can occur
//! during cache operations and store interactions.

use thiserror::Error;

/// Boxed error handed to the cache by the surrounding pipeline
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Cache system errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    ConnectionError(#[from] redis::RedisError),

    #[error("Connection pool error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Cache operation timeout")]
    Timeout,

    #[error("Upstream handler error: {0}")]
    Upstream(BoxError),

    #[error("General cache error: {0}")]
    General(String),
}

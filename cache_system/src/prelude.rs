//! Convenience re-exports for common cache-system usage

// Core cache system components
pub use crate::errors::{BoxError, CacheError};
pub use crate::memory_store::MemoryStore;
pub use crate::redis_store::RedisStore;
pub use crate::store::ResponseStore;

// Re-export centralized config
pub use config::ResponseCacheConfig;

// Common external dependencies
pub use async_trait::async_trait;
pub use redis;

//! Cache system for response storage
//!
//! This crate provides the key-value store capability behind the
//! response cache: a Redis implementation, an in-process one,
//! and the shared error type.

pub mod errors;
pub mod memory_store;
pub mod prelude;
pub mod redis_store;
pub mod store;

// Re-export centralized config
pub use config::ResponseCacheConfig;

pub use errors::{BoxError, CacheError};
pub use memory_store::{MemoryStore, StoreOp, StoreOpKind};
pub use redis_store::RedisStore;
pub use store::ResponseStore;

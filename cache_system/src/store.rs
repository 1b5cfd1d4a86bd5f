//! Key-value store capability
//!
//! The response cache only needs four primitive operations from its
//! backing store. Anything that implements [`ResponseStore`] can sit
//! behind the interceptor and persister.

use crate::errors::CacheError;
use async_trait::async_trait;
use std::fmt::Debug;

#[async_trait]
pub trait ResponseStore: Send + Sync + Debug {
    /// Fetch the raw value stored under `key`, `None` when absent
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key` without an expiration
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError>;

    /// Expire `key` after `ttl` seconds
    async fn expire(&self, key: &str, ttl: u64) -> Result<(), CacheError>;

    /// Authenticate the current connection
    async fn auth(&self, secret: &str) -> Result<(), CacheError>;

    /// Round-trip check against the store
    async fn ping(&self) -> Result<(), CacheError>;
}

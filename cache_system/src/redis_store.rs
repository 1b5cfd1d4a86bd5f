//! Redis-backed response store
//!
//! This module provides the RedisStore struct
//! for Redis operations and connection management.

use crate::errors::CacheError;
use crate::store::ResponseStore;
use async_trait::async_trait;
use config::ResponseCacheConfig;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Redis-based response store
#[derive(Clone)]
pub struct RedisStore {
    client: Arc<Client>,
    url: String,
    auth: Option<String>,
    connect_timeout: Duration,
    connection_pool: Arc<RwLock<Option<MultiplexedConnection>>>,
}

impl Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let connection_status = {
            match self.connection_pool.try_read() {
                Ok(pool) => {
                    if pool.is_some() {
                        "connected"
                    } else {
                        "no_connection"
                    }
                }
                Err(_) => "lock_error",
            }
        };

        f.debug_struct("RedisStore")
            .field("url", &self.url)
            .field("has_auth", &self.auth.is_some())
            .field("connect_timeout", &self.connect_timeout)
            .field("connected", &connection_status)
            .finish()
    }
}

impl RedisStore {
    /// Create a new store; no connection is opened until first use
    pub fn new(config: &ResponseCacheConfig) -> Result<Self, CacheError> {
        let url = config.redis_url();
        let client = Client::open(url.as_str())?;

        Ok(Self {
            client: Arc::new(client),
            url,
            auth: config.redis_auth.clone(),
            connect_timeout: Duration::from_millis(config.connection_timeout_ms),
            connection_pool: Arc::new(RwLock::new(None)),
        })
    }

    /// Create a new store and open (and authenticate) its connection now
    pub async fn connect(config: &ResponseCacheConfig) -> Result<Self, CacheError> {
        let store = Self::new(config)?;
        store.get_connection().await?;
        Ok(store)
    }

    /// Get or create Redis connection
    ///
    /// The write lock is the one-time gate: concurrent first callers wait
    /// for the same connection instead of each opening their own.
    async fn get_connection(&self) -> Result<MultiplexedConnection, CacheError> {
        if let Some(connection) = self.connection_pool.read().await.as_ref() {
            return Ok(connection.clone());
        }

        let mut pool = self.connection_pool.write().await;

        if pool.is_none() {
            let mut connection = tokio::time::timeout(
                self.connect_timeout,
                self.client.get_multiplexed_async_connection(),
            )
            .await
            .map_err(|_| CacheError::Timeout)??;

            if let Some(secret) = &self.auth {
                authenticate(&mut connection, secret).await?;
            }

            tracing::debug!(url = %self.url, "opened redis connection");
            *pool = Some(connection);
        }

        Ok(pool
            .as_ref()
            .ok_or_else(|| CacheError::Connection("Failed to get connection from pool".into()))?
            .clone())
    }

    /// Whether every connection this store opens already sent AUTH with `secret`
    fn authenticated_with(&self, secret: &str) -> bool {
        self.auth.as_deref() == Some(secret)
    }
}

async fn authenticate(conn: &mut MultiplexedConnection, secret: &str) -> Result<(), CacheError> {
    let _: () = redis::cmd("AUTH").arg(secret).query_async(conn).await?;
    Ok(())
}

#[async_trait]
impl ResponseStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.get_connection().await?;

        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<(), CacheError> {
        let mut conn = self.get_connection().await?;

        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<(), CacheError> {
        let mut conn = self.get_connection().await?;

        let seconds = i64::try_from(ttl).unwrap_or(i64::MAX);
        let _: () = conn.expire(key, seconds).await?;
        Ok(())
    }

    async fn auth(&self, secret: &str) -> Result<(), CacheError> {
        let mut conn = self.get_connection().await?;
        if self.authenticated_with(secret) {
            return Ok(());
        }
        authenticate(&mut conn, secret).await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.get_connection().await?;

        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

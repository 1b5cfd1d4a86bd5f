//! Core CacheHaus functionality
//!
//! This module contains the ResponseCache coordinator: the resolved
//! configuration plus the store handle every request shares.

use std::fmt::Debug;
use std::sync::Arc;

use cache_system::{CacheError, RedisStore, ResponseStore};
use config::{AppConfig, ResponseCacheConfig};
use signal_system::{CacheEvent, SignalManager};

/// Response cache coordinator
///
/// Cheap to clone; clones share the configuration, the store connection
/// and the signal manager. Build one at startup and hand it to the
/// middleware as state.
#[derive(Clone)]
pub struct ResponseCache {
    config: Arc<ResponseCacheConfig>,
    store: Arc<dyn ResponseStore>,
    signals: Option<Arc<SignalManager>>,
}

impl Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("has_signals", &self.signals.is_some())
            .finish()
    }
}

impl ResponseCache {
    /// Create a cache over Redis. The connection opens on first use.
    pub fn new(config: ResponseCacheConfig) -> Result<Self, CacheError> {
        let config = resolve(config)?;
        let store = RedisStore::new(&config)?;
        Ok(Self::assemble(config, Arc::new(store)))
    }

    /// Create a cache over Redis and open (and authenticate) the
    /// connection now, so a bad address or secret fails at startup
    pub async fn connect(config: ResponseCacheConfig) -> Result<Self, CacheError> {
        let config = resolve(config)?;
        let store = RedisStore::connect(&config).await?;
        tracing::info!(url = %config.redis_url(), ttl = config.ttl, "response cache connected");
        Ok(Self::assemble(config, Arc::new(store)))
    }

    /// Create a cache over any store
    pub fn with_store(
        config: ResponseCacheConfig,
        store: Arc<dyn ResponseStore>,
    ) -> Result<Self, CacheError> {
        let config = resolve(config)?;
        Ok(Self::assemble(config, store))
    }

    /// Create a cache over any store, authenticating against it first
    /// when a secret is configured
    pub async fn connect_with_store(
        config: ResponseCacheConfig,
        store: Arc<dyn ResponseStore>,
    ) -> Result<Self, CacheError> {
        let cache = Self::with_store(config, store)?;
        if let Some(secret) = cache.config.redis_auth.as_deref() {
            cache.store.auth(secret).await?;
        }
        Ok(cache)
    }

    /// Create a cache over Redis from a loaded application config
    pub fn from_app_config(app_config: &AppConfig) -> Result<Self, CacheError> {
        Self::new(app_config.cache.clone())
    }

    fn assemble(config: ResponseCacheConfig, store: Arc<dyn ResponseStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            signals: None,
        }
    }

    /// Attach a signal manager that receives one event per cache decision
    pub fn with_signals(mut self, signals: Arc<SignalManager>) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Get current configuration
    pub fn config(&self) -> &ResponseCacheConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ResponseStore> {
        &self.store
    }

    pub fn has_signals(&self) -> bool {
        self.signals.is_some()
    }

    /// Ping the store to check connectivity
    pub async fn health_check(&self) -> Result<(), CacheError> {
        self.store.ping().await
    }

    pub(crate) fn emit_signal(&self, event: CacheEvent) {
        if let Some(signal_manager) = &self.signals {
            signal_manager.emit(event);
        }
    }
}

fn resolve(config: ResponseCacheConfig) -> Result<ResponseCacheConfig, CacheError> {
    let config = config.normalized();
    config.validate()?;
    Ok(config)
}

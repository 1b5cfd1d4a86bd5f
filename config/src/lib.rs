//! # Configuration Management for CacheHaus
//!
//! This crate provides the configuration structures for the response cache:
//! where the Redis store lives, how long entries live, which methods are
//! cached and how cache keys are partitioned.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::ResponseCacheConfig;
//!
//! let cache_config = ResponseCacheConfig::default()
//!     .with_ttl(10)
//!     .with_cache_methods(["get", "post"])
//!     .with_cache_header("x-tenant")
//!     .with_prefix("api");
//!
//! assert!(cache_config.is_cacheable_method("POST"));
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [cache]
//! redis_host = "localhost"
//! redis_port = 6379
//! redis_auth = "secret"
//! ttl = 3600
//! cache_methods = ["GET"]
//! cache_header = "x-tenant"
//! prefix = "api"
//! connection_timeout_ms = 5000
//! max_body_bytes = 1048576
//! ```
//!
//! Every key is optional; omitted keys take their defaults.
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from CACHEHAUS_CONFIG or ./cachehaus.toml, defaults otherwise
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./cachehaus.toml";
const CONFIG_PATH_ENV: &str = "CACHEHAUS_CONFIG";

pub const DEFAULT_REDIS_HOST: &str = "localhost";
pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const DEFAULT_TTL: u64 = 60 * 60;
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: ResponseCacheConfig,
}

/// Response cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseCacheConfig {
    pub redis_host: String,
    pub redis_port: u16,
    /// Secret sent with AUTH after connecting
    pub redis_auth: Option<String>,
    /// Default TTL for cache entries (in seconds)
    pub ttl: u64,
    /// Upper-case HTTP methods eligible for caching
    pub cache_methods: Vec<String>,
    /// Request header whose value partitions the key space
    pub cache_header: Option<String>,
    /// Extra key segment placed after the `payload_`/`header_` prefixes
    pub prefix: Option<String>,
    pub connection_timeout_ms: u64,
    /// Largest response body the middleware buffers for caching. Bodies
    /// that may exceed it, or whose length is unbounded, pass through.
    pub max_body_bytes: u64,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            redis_host: DEFAULT_REDIS_HOST.to_string(),
            redis_port: DEFAULT_REDIS_PORT,
            redis_auth: None,
            ttl: DEFAULT_TTL,
            cache_methods: vec!["GET".to_string()],
            cache_header: None,
            prefix: None,
            connection_timeout_ms: DEFAULT_CONNECTION_TIMEOUT_MS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl AppConfig {
    /// Load configuration from the TOML file named in the environment (or .env),
    /// then from the default path, falling back to defaults when neither exists
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(err) if err.not_found() => {}
            Err(err) => return Err(err.into()),
        }

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            let config = Self::default();
            config.cache.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.cache = config.cache.normalized();
        config.cache.validate()?;
        Ok(config)
    }
}

impl ResponseCacheConfig {
    /// Create a new cache configuration pointing at the given Redis server
    pub fn new(redis_host: impl Into<String>, redis_port: u16) -> Self {
        Self {
            redis_host: redis_host.into(),
            redis_port,
            ..Self::default()
        }
    }

    pub fn with_auth(mut self, secret: impl Into<String>) -> Self {
        self.redis_auth = Some(secret.into());
        self
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_cache_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cache_methods = methods
            .into_iter()
            .map(|m| m.as_ref().to_ascii_uppercase())
            .collect();
        self
    }

    pub fn with_cache_header(mut self, header: impl Into<String>) -> Self {
        self.cache_header = Some(header.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_connection_timeout(mut self, timeout_ms: u64) -> Self {
        self.connection_timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: u64) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    /// Canonical form: upper-case methods, empty optional strings dropped
    pub fn normalized(mut self) -> Self {
        for method in &mut self.cache_methods {
            *method = method.trim().to_ascii_uppercase();
        }
        self.redis_auth = self.redis_auth.filter(|s| !s.is_empty());
        self.cache_header = self.cache_header.filter(|s| !s.trim().is_empty());
        self.prefix = self.prefix.filter(|s| !s.is_empty());
        self
    }

    /// Whether responses to `method` are read from and written to the cache
    pub fn is_cacheable_method(&self, method: &str) -> bool {
        self.cache_methods.iter().any(|m| m == method)
    }

    /// Build connection string
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/", self.redis_host, self.redis_port)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.redis_host.is_empty() {
            return Err(ConfigError::Invalid(
                "Redis host cannot be empty".to_string(),
            ));
        }
        if self.redis_port == 0 {
            return Err(ConfigError::Invalid(
                "Redis port cannot be zero".to_string(),
            ));
        }
        if self.connection_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "Cache connection_timeout_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

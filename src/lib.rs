//! # CacheHaus
//!
//! A Redis-backed HTTP response cache that sits between routing and your
//! handlers. Before a handler runs, the cache looks for a stored response
//! and replays it verbatim; after a handler runs, the response is written
//! back with an expiration taken from `Cache-Control: max-age` or the
//! configured default.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use axum::{Router, middleware, routing::get};
//! use cachehaus::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResponseCacheConfig::default()
//!         .with_ttl(10)
//!         .with_cache_methods(["GET", "POST"])
//!         .with_cache_header("x-tenant");
//!
//!     let cache = ResponseCache::connect(config).await?;
//!
//!     let app: Router = Router::new()
//!         .route("/widgets", get(|| async { r#"{"id":5}"# }))
//!         .layer(middleware::from_fn_with_state(cache, response_cache_layer));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! Outside axum, call [`ResponseCache::before`] and [`ResponseCache::after`]
//! directly from the pre- and post-handler stages of your pipeline.

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod headers;
pub mod interceptor;
pub mod keys;
pub mod layer;
pub mod persister;
pub mod prelude;
pub mod ttl;

// Re-export the main public types for convenience
pub use self::core::ResponseCache;
pub use headers::{StoredHeaderValue, StoredHeaders};
pub use interceptor::{CachedResponse, Lookup, X_CACHE, stamp_miss};
pub use keys::CacheKeyPair;
pub use layer::response_cache_layer;
pub use persister::Persisted;
pub use ttl::resolve_ttl;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, ResponseCacheConfig};

// Re-export internal crates used in the public API
pub use cache_system;
pub use signal_system;

// Re-export external dependencies used in public API
pub use async_trait;
pub use axum;

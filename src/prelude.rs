//! Convenience re-exports for common CacheHaus usage
//!
//! # Example
//!
//! ```rust
//! use cachehaus::prelude::*;
//!
//! let config = ResponseCacheConfig::default().with_prefix("api");
//! ```

// Core CacheHaus components
pub use crate::core::ResponseCache;
pub use crate::interceptor::{CachedResponse, Lookup, X_CACHE};
pub use crate::keys::CacheKeyPair;
pub use crate::layer::response_cache_layer;
pub use crate::persister::Persisted;

// Re-export centralized config
pub use config::{AppConfig, ResponseCacheConfig};

// Re-export store and signal systems
pub use cache_system::prelude::*;
pub use signal_system::prelude::*;

// Common external dependencies
pub use tokio;

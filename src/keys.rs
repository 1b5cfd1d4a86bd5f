//! Cache key derivation
//!
//! Every cached response lives under two keys: one for the body, one for
//! the serialized headers. Both keys are built from the same suffix:
//!
//! ```text
//! payload_[{prefix}_][{discriminant}]{path?query}
//! header_[{prefix}_][{discriminant}]{path?query}
//! ```
//!
//! Nothing is hashed or escaped; the URL and discriminant value go into
//! the key verbatim.

use axum::http::{HeaderMap, Uri, request};
use config::ResponseCacheConfig;
use std::borrow::Cow;

pub const PAYLOAD_PREFIX: &str = "payload_";
pub const HEADER_PREFIX: &str = "header_";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKeyPair {
    payload_key: String,
    header_key: String,
}

impl CacheKeyPair {
    pub fn new(config: &ResponseCacheConfig, discriminant: Option<&str>, url: &str) -> Self {
        let mut suffix = String::with_capacity(url.len() + 16);
        if let Some(prefix) = &config.prefix {
            suffix.push_str(prefix);
            suffix.push('_');
        }
        if let Some(value) = discriminant {
            suffix.push_str(value);
        }
        suffix.push_str(url);

        Self {
            payload_key: format!("{PAYLOAD_PREFIX}{suffix}"),
            header_key: format!("{HEADER_PREFIX}{suffix}"),
        }
    }

    /// Keys for an incoming request, partitioned by the discriminant header
    /// when one is configured and present
    pub fn for_request(config: &ResponseCacheConfig, request: &request::Parts) -> Self {
        let discriminant = discriminant(config, &request.headers);
        Self::new(config, discriminant.as_deref(), request_url(&request.uri))
    }

    pub fn payload_key(&self) -> &str {
        &self.payload_key
    }

    pub fn header_key(&self) -> &str {
        &self.header_key
    }

    /// The part both keys share
    pub fn suffix(&self) -> &str {
        &self.payload_key[PAYLOAD_PREFIX.len()..]
    }
}

/// Path plus query string, as the client sent it
pub fn request_url(uri: &Uri) -> &str {
    uri.path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path())
}

/// Value of the configured discriminant header on this request, if any
pub fn discriminant<'a>(
    config: &ResponseCacheConfig,
    headers: &'a HeaderMap,
) -> Option<Cow<'a, str>> {
    let name = config.cache_header.as_deref()?;
    let value = headers.get(name)?;
    Some(String::from_utf8_lossy(value.as_bytes()))
}

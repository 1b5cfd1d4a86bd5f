//! Pre-handler lookup
//!
//! Decides, before the handler runs, whether the request can be answered
//! from the store. A hit is terminal: the caller replies with the cached
//! response and must not run the handler.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode, request};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use cache_system::CacheError;
use signal_system::{CacheEvent, EventType};
use tracing::{debug, instrument, warn};

use crate::core::ResponseCache;
use crate::headers::StoredHeaders;
use crate::keys::{CacheKeyPair, request_url};

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Outcome of a pre-handler lookup
#[derive(Debug)]
pub enum Lookup {
    /// Method is not cacheable; the store was not consulted
    Bypass,
    /// Nothing usable stored; run the handler
    Miss,
    /// Reply with this and skip the handler
    Hit(CachedResponse),
}

/// A response replayed from the store
#[derive(Debug, Clone)]
pub struct CachedResponse {
    headers: StoredHeaders,
    body: Bytes,
}

impl CachedResponse {
    pub fn headers(&self) -> &StoredHeaders {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

impl IntoResponse for CachedResponse {
    /// Status 200, every stored header, `X-Cache: HIT`, stored body
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = StatusCode::OK;
        self.headers.apply_to(response.headers_mut());
        response
            .headers_mut()
            .insert(X_CACHE, HeaderValue::from_static("HIT"));
        response
    }
}

/// Mark a forwarded response as a cache miss
pub fn stamp_miss(headers: &mut HeaderMap) {
    headers.insert(X_CACHE, HeaderValue::from_static("MISS"));
}

impl ResponseCache {
    /// Look the request up in the store.
    ///
    /// Store errors are returned as-is; the header entry is not fetched
    /// when the payload fetch fails. Stored headers that fail to parse
    /// count as a miss.
    #[instrument(skip_all, fields(method = %request.method, url = %request_url(&request.uri)))]
    pub async fn before(&self, request: &request::Parts) -> Result<Lookup, CacheError> {
        let method = request.method.as_str();
        let url = request_url(&request.uri);

        if !self.config().is_cacheable_method(method) {
            debug!(outcome = "bypass", "method not cacheable");
            self.emit_signal(CacheEvent::new(EventType::Bypass, method, url));
            return Ok(Lookup::Bypass);
        }

        let keys = CacheKeyPair::for_request(self.config(), request);
        crate::debug_log!(
            payload_key = %keys.payload_key(),
            header_key = %keys.header_key(),
            "looking up cached response"
        );

        let payload = self
            .store()
            .get(keys.payload_key())
            .await
            .inspect_err(|err| self.report_lookup_error(method, url, &keys, err))?;
        let headers = self
            .store()
            .get(keys.header_key())
            .await
            .inspect_err(|err| self.report_lookup_error(method, url, &keys, err))?;

        let (Some(payload), Some(headers)) = (non_empty(payload), non_empty(headers)) else {
            debug!(outcome = "miss", "no cached response");
            self.emit_signal(
                CacheEvent::new(EventType::Miss, method, url).with_key(keys.payload_key()),
            );
            return Ok(Lookup::Miss);
        };

        match StoredHeaders::from_json(&headers) {
            Ok(headers) => {
                debug!(outcome = "hit", "serving cached response");
                self.emit_signal(
                    CacheEvent::new(EventType::Hit, method, url).with_key(keys.payload_key()),
                );
                Ok(Lookup::Hit(CachedResponse {
                    headers,
                    body: Bytes::from(payload),
                }))
            }
            Err(err) => {
                warn!(key = %keys.header_key(), error = %err, "unreadable cached headers, treating as miss");
                self.emit_signal(
                    CacheEvent::new(EventType::Error, method, url)
                        .with_key(keys.payload_key())
                        .with_message(err.to_string()),
                );
                Ok(Lookup::Miss)
            }
        }
    }

    fn report_lookup_error(&self, method: &str, url: &str, keys: &CacheKeyPair, err: &CacheError) {
        warn!(key = %keys.payload_key(), error = %err, "cache lookup failed");
        self.emit_signal(
            CacheEvent::new(EventType::Error, method, url)
                .with_key(keys.payload_key())
                .with_message(err.to_string()),
        );
    }
}

fn non_empty(value: Option<Vec<u8>>) -> Option<Vec<u8>> {
    value.filter(|v| !v.is_empty())
}

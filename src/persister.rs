//! Post-handler write-back
//!
//! Writes the completed response into the store: headers first, then the
//! body, each followed by its own expiration. The two entries are not
//! written atomically; a lookup only hits when both are present.

use axum::http::{request, response};
use cache_system::{BoxError, CacheError};
use signal_system::{CacheEvent, EventType};
use tracing::{debug, instrument, warn};

use crate::core::ResponseCache;
use crate::headers::StoredHeaders;
use crate::keys::{CacheKeyPair, request_url};
use crate::ttl::resolve_ttl;

/// Outcome of a write-back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persisted {
    /// Method is not cacheable; nothing was written
    Skipped,
    /// Both entries written and set to expire after `ttl` seconds
    Stored { ttl: u64 },
}

impl ResponseCache {
    /// Persist a completed response.
    ///
    /// An `upstream` error short-circuits without touching the store and
    /// comes back as [`CacheError::Upstream`]. The first failing store
    /// call aborts the remaining writes and its error is returned.
    #[instrument(skip_all, fields(method = %request.method, url = %request_url(&request.uri)))]
    pub async fn after(
        &self,
        request: &request::Parts,
        response: &response::Parts,
        body: &[u8],
        upstream: Option<BoxError>,
    ) -> Result<Persisted, CacheError> {
        if let Some(err) = upstream {
            debug!(error = %err, "upstream error, not caching");
            return Err(CacheError::Upstream(err));
        }

        let method = request.method.as_str();
        let url = request_url(&request.uri);

        if !self.config().is_cacheable_method(method) {
            debug!(outcome = "skipped", "method not cacheable");
            return Ok(Persisted::Skipped);
        }

        let keys = CacheKeyPair::for_request(self.config(), request);
        let ttl = resolve_ttl(&response.headers, self.config().ttl);
        let header_json = StoredHeaders::from_header_map(&response.headers).to_json()?;

        match self.write_entry(&keys, &header_json, body, ttl).await {
            Ok(()) => {
                debug!(ttl, bytes = body.len(), "cached response");
                self.emit_signal(
                    CacheEvent::new(EventType::Stored, method, url)
                        .with_key(keys.payload_key())
                        .with_ttl(ttl),
                );
                Ok(Persisted::Stored { ttl })
            }
            Err(err) => {
                warn!(key = %keys.payload_key(), error = %err, "cache write failed");
                self.emit_signal(
                    CacheEvent::new(EventType::Error, method, url)
                        .with_key(keys.payload_key())
                        .with_message(err.to_string()),
                );
                Err(err)
            }
        }
    }

    async fn write_entry(
        &self,
        keys: &CacheKeyPair,
        header_json: &[u8],
        body: &[u8],
        ttl: u64,
    ) -> Result<(), CacheError> {
        let store = self.store();

        store.set(keys.header_key(), header_json).await?;
        store.expire(keys.header_key(), ttl).await?;
        crate::trace_log!(key = %keys.header_key(), ttl, "wrote header entry");

        store.set(keys.payload_key(), body).await?;
        store.expire(keys.payload_key(), ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, Response};
    use cache_system::{MemoryStore, ResponseStore, StoreOp, StoreOpKind};
    use config::ResponseCacheConfig;
    use std::sync::Arc;

    fn request(method: &str, uri: &str) -> request::Parts {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn response(headers: &[(&str, &str)]) -> response::Parts {
        let mut builder = Response::builder();
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn cache(store: &Arc<MemoryStore>, config: ResponseCacheConfig) -> ResponseCache {
        ResponseCache::with_store(config, store.clone()).unwrap()
    }

    #[tokio::test]
    async fn writes_are_sequenced_header_first() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(&store, ResponseCacheConfig::default());

        let persisted = cache
            .after(&request("GET", "/w"), &response(&[]), b"body", None)
            .await
            .unwrap();

        assert_eq!(persisted, Persisted::Stored { ttl: 3600 });
        assert_eq!(
            store.ops(),
            vec![
                StoreOp::Set("header_/w".to_string()),
                StoreOp::Expire("header_/w".to_string(), 3600),
                StoreOp::Set("payload_/w".to_string()),
                StoreOp::Expire("payload_/w".to_string(), 3600),
            ]
        );
    }

    #[tokio::test]
    async fn max_age_sets_both_expirations() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(&store, ResponseCacheConfig::default());

        cache
            .after(
                &request("GET", "/w"),
                &response(&[("cache-control", "max-age=120")]),
                b"body",
                None,
            )
            .await
            .unwrap();

        assert_eq!(store.ttl("header_/w"), Some(120));
        assert_eq!(store.ttl("payload_/w"), Some(120));
    }

    #[tokio::test]
    async fn upstream_error_touches_nothing() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(&store, ResponseCacheConfig::default());

        let err = cache
            .after(
                &request("GET", "/w"),
                &response(&[]),
                b"body",
                Some("handler exploded".into()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CacheError::Upstream(_)));
        assert_eq!(err.to_string(), "Upstream handler error: handler exploded");
        assert!(store.ops().is_empty());
    }

    #[tokio::test]
    async fn uncacheable_method_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(&store, ResponseCacheConfig::default());

        let persisted = cache
            .after(&request("DELETE", "/w"), &response(&[]), b"body", None)
            .await
            .unwrap();

        assert_eq!(persisted, Persisted::Skipped);
        assert!(store.ops().is_empty());
    }

    #[tokio::test]
    async fn header_write_failure_aborts_before_payload() {
        let store = Arc::new(MemoryStore::new());
        store.fail_on(StoreOpKind::Set);
        let cache = cache(&store, ResponseCacheConfig::default());

        let err = cache
            .after(&request("GET", "/w"), &response(&[]), b"body", None)
            .await
            .unwrap_err();

        assert!(matches!(err, CacheError::Connection(_)));
        assert_eq!(store.ops(), vec![StoreOp::Set("header_/w".to_string())]);
    }

    #[tokio::test]
    async fn expire_failure_aborts_remaining_writes() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(&store, ResponseCacheConfig::default());
        store.fail_on(StoreOpKind::Expire);

        let err = cache
            .after(&request("GET", "/w"), &response(&[]), b"body", None)
            .await
            .unwrap_err();

        assert!(matches!(err, CacheError::Connection(_)));
        // The header entry was written before its expire failed
        assert_eq!(store.keys(), vec!["header_/w".to_string()]);
    }

    #[tokio::test]
    async fn stored_headers_are_json() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(
            &store,
            ResponseCacheConfig::default()
                .with_prefix("api")
                .with_cache_header("x-tenant"),
        );
        let req = Request::get("/w")
            .header("x-tenant", "acme")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        cache
            .after(&req, &response(&[("content-type", "text/plain")]), b"hi", None)
            .await
            .unwrap();

        let raw = store.get("header_api_acme/w").await.unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(json, serde_json::json!({ "content-type": "text/plain" }));
        assert_eq!(
            store.get("payload_api_acme/w").await.unwrap(),
            Some(b"hi".to_vec())
        );
    }
}

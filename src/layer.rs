//! Axum middleware wiring the lookup and write-back around a handler.
//!
//! ```rust,no_run
//! use axum::{Router, middleware, routing::get};
//! use cachehaus::prelude::*;
//!
//! # async fn run() -> Result<(), CacheError> {
//! let cache = ResponseCache::connect(ResponseCacheConfig::default()).await?;
//! let app: Router = Router::new()
//!     .route("/widgets", get(|| async { "widgets" }))
//!     .layer(middleware::from_fn_with_state(cache, response_cache_layer));
//! # Ok(())
//! # }
//! ```

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{self, StatusCode, request, response},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cache_system::BoxError;
use tracing::{Instrument, debug, error, instrument, warn};

use crate::core::ResponseCache;
use crate::interceptor::{Lookup, stamp_miss};

/// Middleware for Redis-backed response caching.
///
/// Hits are answered from the store without running the handler. Misses
/// run the handler and get `X-Cache: MISS`; a successful response whose
/// body fits in `max_body_bytes` is then written back on a spawned task
/// while the response goes out. Error statuses, unbounded bodies and
/// oversized bodies are passed through without touching the store.
///
/// A failed lookup ends the request with a 500; a failed write-back is
/// only logged.
#[instrument(skip_all, fields(method = %request.method(), path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    match cache.before(&parts).await {
        Ok(Lookup::Hit(cached)) => return cached.into_response(),
        Ok(Lookup::Bypass) => return next.run(Request::from_parts(parts, body)).await,
        Ok(Lookup::Miss) => {}
        Err(err) => {
            error!(error = %err, "cache lookup failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let head = request_head(&parts);
    let response = next.run(Request::from_parts(parts, body)).await;

    let (mut response_parts, body) = response.into_parts();
    stamp_miss(&mut response_parts.headers);

    if let Some(upstream) = upstream_error(response_parts.status) {
        if let Err(err) = cache.after(&head, &response_parts, &[], Some(upstream)).await {
            debug!(error = %err, "not caching failed response");
        }
        return Response::from_parts(response_parts, body);
    }

    let max_body_bytes = cache.config().max_body_bytes;
    if body
        .size_hint()
        .upper()
        .is_none_or(|upper| upper > max_body_bytes)
    {
        debug!(limit = max_body_bytes, "body unbounded or over limit, not caching");
        return Response::from_parts(response_parts, body);
    }

    let limit = usize::try_from(max_body_bytes).unwrap_or(usize::MAX);
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(b) => b,
        Err(err) => {
            error!(error = %err, "failed to buffer handler response");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let write_back = {
        let response_head = response_head(&response_parts);
        let bytes = bytes.clone();
        async move {
            if let Err(err) = cache.after(&head, &response_head, &bytes, None).await {
                warn!(error = %err, "response not cached");
            }
        }
    };
    tokio::spawn(write_back.in_current_span());

    Response::from_parts(response_parts, Body::from(bytes))
}

/// Any non-2xx status counts as a failed handler
fn upstream_error(status: StatusCode) -> Option<BoxError> {
    (!status.is_success()).then(|| BoxError::from(format!("handler responded with {status}")))
}

/// Method, URI and headers of a request, without its extensions
fn request_head(parts: &request::Parts) -> request::Parts {
    let mut head = http::Request::new(());
    *head.method_mut() = parts.method.clone();
    *head.uri_mut() = parts.uri.clone();
    *head.version_mut() = parts.version;
    *head.headers_mut() = parts.headers.clone();
    head.into_parts().0
}

/// Status and headers of a response, without its extensions
fn response_head(parts: &response::Parts) -> response::Parts {
    let mut head = http::Response::new(());
    *head.status_mut() = parts.status;
    *head.version_mut() = parts.version;
    *head.headers_mut() = parts.headers.clone();
    head.into_parts().0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_success_statuses_are_cacheable() {
        assert!(upstream_error(StatusCode::OK).is_none());
        assert!(upstream_error(StatusCode::NO_CONTENT).is_none());

        let err = upstream_error(StatusCode::SERVICE_UNAVAILABLE).unwrap();
        assert_eq!(err.to_string(), "handler responded with 503 Service Unavailable");
        assert!(upstream_error(StatusCode::NOT_FOUND).is_some());
        assert!(upstream_error(StatusCode::MOVED_PERMANENTLY).is_some());
    }

    #[test]
    fn response_head_keeps_status_and_headers() {
        let response = http::Response::builder()
            .status(StatusCode::CREATED)
            .header("content-type", "text/plain")
            .body(())
            .unwrap();
        let (parts, _) = response.into_parts();

        let head = response_head(&parts);
        assert_eq!(head.status, StatusCode::CREATED);
        assert_eq!(head.headers["content-type"], "text/plain");
    }
}

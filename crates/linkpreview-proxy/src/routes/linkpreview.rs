//! Link-preview proxy handlers.
//!
//! Handles `GET /?q=<url>` and `GET /linkpreview/?q=<url>`. Both share the
//! same cache; they differ only in the `Content-Type` they put on the reply.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, header};
use axum::response::Response;
use serde::Deserialize;

use crate::cache::{CacheKey, CachedResponse, Freshness};
use crate::error::ProxyError;
use crate::state::AppState;
use crate::upstream::UpstreamError;

/// Query parameters accepted by the preview routes.
#[derive(Debug, Default, Deserialize)]
pub struct PreviewParams {
    /// URL to preview. Missing is treated as empty.
    #[serde(default)]
    pub q: String,
}

/// `GET /linkpreview/?q=` - upstream JSON served as `application/json`.
pub async fn linkpreview_handler(
    State(state): State<AppState>,
    Query(params): Query<PreviewParams>,
) -> Result<Response, ProxyError> {
    let cached = fetch_preview(&state, &params.q).await?;
    Ok(build_response(
        cached,
        Some(HeaderValue::from_static("application/json")),
    ))
}

/// `GET /?q=` - upstream body passed through without a content type.
pub async fn passthrough_handler(
    State(state): State<AppState>,
    Query(params): Query<PreviewParams>,
) -> Result<Response, ProxyError> {
    let cached = fetch_preview(&state, &params.q).await?;
    Ok(build_response(cached, None))
}

/// Serve `query` from the cache, or from the upstream on a miss.
///
/// This is the main entry point. It:
/// 1. Derives the cache key from the query and today's day of month
/// 2. Returns the cached response verbatim on a hit
/// 3. On a miss, asks the upstream and caches whatever status it answered with
///
/// Transport failures are returned as errors and leave the cache untouched.
/// Concurrent misses on the same key share one upstream call.
pub async fn fetch_preview(state: &AppState, query: &str) -> Result<CachedResponse, ProxyError> {
    let key = CacheKey::today(query, state.clock.as_ref());
    let upstream = &state.upstream;

    let (cached, freshness) = state
        .cache
        .get_or_fetch(key.clone(), async {
            tracing::info!(query = %query, "requesting from origin");
            let (body, status) = upstream.fetch(query).await?;
            Ok::<_, UpstreamError>(CachedResponse::new(body, status))
        })
        .await?;

    match freshness {
        Freshness::Cached => {
            tracing::info!(query = %query, key = %key, "serving from cache");
        }
        Freshness::Fetched => {
            tracing::debug!(
                key = %key,
                status = cached.status.as_u16(),
                "cached upstream response"
            );
        }
    }

    Ok(cached)
}

/// Build the reply from a cached upstream response.
fn build_response(cached: CachedResponse, content_type: Option<HeaderValue>) -> Response {
    let mut response = Response::new(Body::from(cached.body));
    *response.status_mut() = cached.status;
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
    }
    response
}

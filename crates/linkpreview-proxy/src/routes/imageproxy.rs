//! Image-proxy passthrough.
//!
//! Handles `GET /imageproxy/?src=<path>`. Nothing here is cached; the image
//! proxy sets its own cache headers, which are relayed.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::error::ProxyError;
use crate::state::AppState;

/// Query parameters accepted by the image route.
#[derive(Debug, Default, Deserialize)]
pub struct ImageParams {
    /// Path in the image proxy's own URL scheme, e.g. `100x100/https://host/a.jpg`.
    #[serde(default)]
    pub src: String,
}

/// Rewrite the request to `/<src>` and relay it to the image proxy.
pub async fn image_handler(
    State(state): State<AppState>,
    Query(params): Query<ImageParams>,
    headers: HeaderMap,
) -> Result<Response, ProxyError> {
    // Only routed when configured.
    let Some(image_proxy) = state.image_proxy.as_ref() else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };

    let relayed = image_proxy.forward(&params.src, &headers).await?;

    let mut response = Response::new(Body::from(relayed.body));
    *response.status_mut() = relayed.status;
    *response.headers_mut() = relayed.headers;
    Ok(response)
}

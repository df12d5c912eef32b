//! Forwarding client for an external image-proxy service.
//!
//! Image resizing is not done here. `GET /imageproxy/?src=<path>` is rewritten
//! to `GET <imageproxy>/<path>` and the answer is streamed back unchanged,
//! apart from dropping hop-by-hop headers.

use std::time::Duration;

use axum::http::{HeaderMap, StatusCode, header};
use bytes::Bytes;

/// Request headers passed through to the image proxy.
const FORWARDED_REQUEST_HEADERS: &[header::HeaderName] = &[
    header::ACCEPT,
    header::IF_NONE_MATCH,
    header::IF_MODIFIED_SINCE,
];

/// Response headers passed back to the caller.
const FORWARDED_RESPONSE_HEADERS: &[header::HeaderName] = &[
    header::CONTENT_TYPE,
    header::CACHE_CONTROL,
    header::ETAG,
    header::LAST_MODIFIED,
    header::EXPIRES,
];

/// Failure talking to the image-proxy service.
#[derive(Debug, thiserror::Error)]
pub enum ImageProxyError {
    /// The HTTP client could not be constructed.
    #[error("failed to build image proxy client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, TLS or timeout failure.
    #[error("image proxy request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response body could not be read to the end.
    #[error("failed to read image proxy body: {0}")]
    Body(#[source] reqwest::Error),
}

/// Response relayed from the image proxy.
#[derive(Debug)]
pub struct ImageResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Client for the image-proxy service.
#[derive(Clone)]
pub struct ImageProxy {
    http: reqwest::Client,
    base_url: String,
}

impl ImageProxy {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ImageProxyError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ImageProxyError::Client)?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    /// Rewrite `src` into the image proxy's own path space.
    pub fn target_url(&self, src: &str) -> String {
        format!("{}/{}", self.base_url, src.trim_start_matches('/'))
    }

    /// Forward a request for `src` and return the proxied response.
    pub async fn forward(
        &self,
        src: &str,
        request_headers: &HeaderMap,
    ) -> Result<ImageResponse, ImageProxyError> {
        let target = self.target_url(src);
        tracing::debug!(src = %src, target = %target, "forwarding to image proxy");

        let mut request = self.http.get(&target);
        for name in FORWARDED_REQUEST_HEADERS {
            if let Some(value) = request_headers.get(name) {
                request = request.header(name, value);
            }
        }

        let response = request.send().await.map_err(ImageProxyError::Transport)?;
        let status = response.status();

        let mut headers = HeaderMap::new();
        for name in FORWARDED_RESPONSE_HEADERS {
            if let Some(value) = response.headers().get(name) {
                headers.insert(name.clone(), value.clone());
            }
        }

        let body = response.bytes().await.map_err(ImageProxyError::Body)?;

        Ok(ImageResponse {
            status,
            headers,
            body,
        })
    }
}

//! Error types for the proxy.
//!
//! Synthetic errors are rendered as short plain-text bodies. Errors that
//! originate upstream (a 4xx or 5xx with a readable body) are not errors here:
//! they are cached and replayed like any other response.

use std::sync::Arc;

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::imageproxy::ImageProxyError;
use crate::upstream::UpstreamError;

/// Proxy error type.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The `Referer` header did not match the configured prefix.
    #[error("forbidden")]
    Forbidden,

    /// The link-preview upstream could not be reached or read.
    #[error("{0}")]
    Upstream(#[from] Arc<UpstreamError>),

    /// The image-proxy service could not be reached or read.
    #[error("{0}")]
    ImageProxy(#[from] ImageProxyError),
}

impl From<UpstreamError> for ProxyError {
    fn from(err: UpstreamError) -> Self {
        Self::Upstream(Arc::new(err))
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            Self::Upstream(err) => {
                tracing::error!(error = %err, "upstream error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server Error")
            }
            Self::ImageProxy(err) => {
                tracing::error!(error = %err, "image proxy error");
                (StatusCode::BAD_GATEWAY, "Bad Gateway")
            }
        };

        plain_text(status, message)
    }
}

/// Plain-text error response with a trailing newline.
fn plain_text(status: StatusCode, message: &str) -> Response {
    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        ),
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
    ];

    (status, headers, format!("{message}\n")).into_response()
}

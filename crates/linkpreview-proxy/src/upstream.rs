//! Client for the upstream link-preview API.
//!
//! Every cache miss becomes one `POST` to the configured endpoint with a JSON
//! body of the form:
//!
//! ```json
//! { "key": "<api key>", "q": "<query>", "fields": "title,description,image,url" }
//! ```
//!
//! Whatever status the upstream answers with is returned as-is; only
//! transport and body-read failures are errors.

use std::time::Duration;

use axum::http::StatusCode;
use bytes::Bytes;
use serde::Serialize;

/// Default upstream endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.linkpreview.net";

/// Fields requested from the upstream for every preview.
///
/// See <https://docs.linkpreview.net/#query-parameters>.
pub const PREVIEW_FIELDS: &str = "title,description,image,url";

/// Outbound request body.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamRequest {
    pub key: String,
    pub q: String,
    pub fields: String,
}

impl UpstreamRequest {
    pub fn new(api_key: &str, query: &str) -> Self {
        Self {
            key: api_key.to_string(),
            q: query.to_string(),
            fields: PREVIEW_FIELDS.to_string(),
        }
    }
}

/// Failure to obtain a complete upstream response.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The HTTP client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, TLS or timeout failure while sending the request.
    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The response body could not be read to the end.
    #[error("failed to read upstream body: {0}")]
    Body(#[source] reqwest::Error),
}

/// HTTP client bound to one upstream endpoint and API key.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl UpstreamClient {
    /// Build a client with a per-request timeout.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request a preview for `query` and return the full body and status.
    pub async fn fetch(&self, query: &str) -> Result<(Bytes, StatusCode), UpstreamError> {
        let request = UpstreamRequest::new(&self.api_key, query);

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(UpstreamError::Body)?;

        tracing::debug!(
            query = %query,
            status = status.as_u16(),
            bytes = body.len(),
            "upstream responded"
        );

        Ok((body, status))
    }
}

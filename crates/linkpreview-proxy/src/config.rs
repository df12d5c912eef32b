//! Application configuration loaded from environment variables.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::upstream::DEFAULT_ENDPOINT;

/// Default upstream request timeout in seconds.
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Certificate and key for serving HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// PEM certificate chain.
    pub cert_path: PathBuf,
    /// PEM private key.
    pub key_path: PathBuf,
}

/// Application configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080").
    pub bind_addr: String,

    /// API key sent to the link-preview upstream.
    pub linkpreview_key: String,

    /// Link-preview upstream endpoint.
    pub linkpreview_url: String,

    /// Timeout for a single upstream request.
    pub upstream_timeout: Duration,

    /// HTTPS settings; `None` serves plain HTTP.
    pub tls: Option<TlsConfig>,

    /// Required `Referer` prefix. Empty disables the check.
    pub allowed_referer: String,

    /// Base URL of the image-proxy service. `None` leaves `/imageproxy/` unmounted.
    pub imageproxy_url: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("linkpreview_key", &"<redacted>")
            .field("linkpreview_url", &self.linkpreview_url)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("tls", &self.tls)
            .field("allowed_referer", &self.allowed_referer)
            .field("imageproxy_url", &self.imageproxy_url)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `LINK_PREVIEW_KEY`: linkpreview.net API key
    ///
    /// Optional:
    /// - `ADDR`: Server bind address (default: "0.0.0.0:8080")
    /// - `LINKPREVIEW_API_URL`: Upstream endpoint (default: "https://api.linkpreview.net")
    /// - `UPSTREAM_TIMEOUT_SECS`: Upstream request timeout (default: 10)
    /// - `SSL_CERT` / `SSL_KEY`: PEM files; HTTPS only when both are set
    /// - `ALLOWED_REFERER`: Referer prefix required on proxied routes
    /// - `IMAGEPROXY_URL`: Image-proxy service to forward `/imageproxy/` to
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = non_empty_var("ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());

        let linkpreview_key = non_empty_var("LINK_PREVIEW_KEY")
            .ok_or_else(|| anyhow::anyhow!("LINK_PREVIEW_KEY environment variable is required"))?;

        let linkpreview_url =
            non_empty_var("LINKPREVIEW_API_URL").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let upstream_timeout = match non_empty_var("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .with_context(|| format!("invalid UPSTREAM_TIMEOUT_SECS: {raw:?}"))?,
            ),
            None => Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        };

        let tls = match (non_empty_var("SSL_CERT"), non_empty_var("SSL_KEY")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => {
                tracing::warn!("only one of SSL_CERT/SSL_KEY is set, serving plain HTTP");
                None
            }
        };

        let allowed_referer = std::env::var("ALLOWED_REFERER").unwrap_or_default();

        let imageproxy_url = non_empty_var("IMAGEPROXY_URL")
            .map(|url| url.trim_end_matches('/').to_string());

        tracing::info!(
            bind_addr = %bind_addr,
            linkpreview_url = %linkpreview_url,
            upstream_timeout_secs = upstream_timeout.as_secs(),
            tls = tls.is_some(),
            allowed_referer = %allowed_referer,
            imageproxy_url = ?imageproxy_url,
            "proxy configuration loaded"
        );

        Ok(Self {
            bind_addr,
            linkpreview_key,
            linkpreview_url,
            upstream_timeout,
            tls,
            allowed_referer,
            imageproxy_url,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

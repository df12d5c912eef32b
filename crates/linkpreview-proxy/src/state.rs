//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::cache::{DayClock, LocalClock, ResponseCache};
use crate::config::Config;
use crate::imageproxy::ImageProxy;
use crate::upstream::UpstreamClient;

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Upstream responses keyed by query and day of month.
    pub cache: ResponseCache,

    /// Link-preview API client.
    pub upstream: UpstreamClient,

    /// Image-proxy forwarder, when one is configured.
    pub image_proxy: Option<ImageProxy>,

    /// Day-of-month source for cache keys.
    pub clock: Arc<dyn DayClock>,
}

impl AppState {
    /// Create a new application state from configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_parts(config, ResponseCache::new(), Arc::new(LocalClock))
    }

    /// Create state around an existing cache and clock.
    pub fn with_parts(
        config: Config,
        cache: ResponseCache,
        clock: Arc<dyn DayClock>,
    ) -> anyhow::Result<Self> {
        let upstream = UpstreamClient::new(
            config.linkpreview_url.clone(),
            config.linkpreview_key.clone(),
            config.upstream_timeout,
        )?;

        let image_proxy = config
            .imageproxy_url
            .as_deref()
            .map(|url| ImageProxy::new(url, config.upstream_timeout))
            .transpose()?;

        tracing::info!(
            cache_ttl_secs = cache.default_ttl().as_secs(),
            upstream = %upstream.endpoint(),
            image_proxy = image_proxy.is_some(),
            "application state initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            cache,
            upstream,
            image_proxy,
            clock,
        })
    }
}

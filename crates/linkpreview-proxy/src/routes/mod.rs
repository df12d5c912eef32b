//! Route definitions for the proxy.
//!
//! ## Routes
//!
//! - `GET /health` - Health check (JSON, never referer-gated)
//! - `GET /?q=<url>` - Link preview, upstream body passed through
//! - `GET /linkpreview/?q=<url>` - Link preview served as `application/json`
//! - `GET /imageproxy/?src=<path>` - Forwarded to the image proxy (when configured)

mod health;
mod imageproxy;
pub mod linkpreview;

use axum::Router;
use axum::routing::get;

use crate::referer::require_referer;
use crate::state::AppState;

/// Build the complete proxy router.
pub fn router(state: AppState) -> Router {
    let mut proxied = Router::new()
        .route("/", get(linkpreview::passthrough_handler))
        .route("/linkpreview", get(linkpreview::linkpreview_handler))
        .route("/linkpreview/", get(linkpreview::linkpreview_handler));

    if state.image_proxy.is_some() {
        proxied = proxied
            .route("/imageproxy", get(imageproxy::image_handler))
            .route("/imageproxy/", get(imageproxy::image_handler));
    }

    let proxied = require_referer(&state.config.allowed_referer, proxied);

    Router::new()
        .route("/health", get(health::health_check))
        .merge(proxied)
        .with_state(state)
}

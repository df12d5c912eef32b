//! Linkpreview Proxy - caching reverse proxy for the linkpreview.net API.
//!
//! Fronts the link-preview API so browsers never see the API key and repeated
//! lookups of the same URL do not spend upstream quota.
//!
//! # Architecture
//!
//! - **Cache**: In-process moka cache keyed by query + day of month, 24h TTL
//! - **Upstream**: reqwest client POSTing `{key, q, fields}` to the API
//! - **Routes**: Preview handlers and an image-proxy passthrough
//! - **Referer**: Optional `Referer` prefix gate in front of the proxied routes
//!
//! # URL Pattern
//!
//! ```text
//! GET /?q={url}
//! GET /linkpreview/?q={url}
//! GET /imageproxy/?src={path}
//! ```
//!
//! # Caching
//!
//! Every upstream answer whose body could be read is cached for a day,
//! including 4xx/5xx statuses. Transport failures are never cached.

pub mod cache;
pub mod config;
pub mod error;
pub mod imageproxy;
pub mod referer;
pub mod routes;
pub mod state;
pub mod upstream;

#[cfg(test)]
mod testing;

pub use cache::{CacheKey, CachedResponse, ResponseCache};
pub use config::Config;
pub use error::ProxyError;
pub use referer::require_referer;
pub use routes::router;
pub use state::AppState;

//! Referer prefix check middleware.
//!
//! The `Referer` header is supplied by the client and trivially spoofed. This
//! keeps casual hotlinkers off the upstream quota; it is not authorization.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::header::REFERER;
use axum::middleware::{self, Next};
use axum::response::Response;

use crate::error::ProxyError;

/// Prefix a request's `Referer` must start with.
#[derive(Clone, Debug)]
pub struct AllowedReferer(Arc<str>);

impl AllowedReferer {
    pub fn new(prefix: &str) -> Self {
        Self(Arc::from(prefix))
    }

    /// Literal byte-prefix test on the raw header. A missing header counts as `""`.
    pub fn permits(&self, referer: Option<&[u8]>) -> bool {
        referer.unwrap_or_default().starts_with(self.0.as_bytes())
    }
}

/// Gate every route of `router` behind a `Referer` prefix check.
///
/// An empty `allowed_prefix` returns the router unchanged.
pub fn require_referer<S>(allowed_prefix: &str, router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if allowed_prefix.is_empty() {
        return router;
    }

    router.route_layer(middleware::from_fn_with_state(
        AllowedReferer::new(allowed_prefix),
        check_referer,
    ))
}

async fn check_referer(
    State(allowed): State<AllowedReferer>,
    request: Request,
    next: Next,
) -> Result<Response, ProxyError> {
    let referer = request.headers().get(REFERER).map(|value| value.as_bytes());

    if !allowed.permits(referer) {
        tracing::debug!(
            referer = ?referer.map(String::from_utf8_lossy),
            "referer not allowed"
        );
        return Err(ProxyError::Forbidden);
    }

    Ok(next.run(request).await)
}

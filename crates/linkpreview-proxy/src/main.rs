//! Linkpreview Proxy - HTTP(S) server fronting the linkpreview.net API.
//!
//! Serves cached link previews and relays image-proxy requests.

use axum::http::Request;
use axum_server::tls_rustls::RustlsConfig;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use linkpreview_proxy::{AppState, Config, router};

/// Linkpreview Proxy - caching proxy for link previews.
#[derive(Parser, Debug)]
#[command(name = "linkpreview-proxy")]
#[command(about = "Caching reverse proxy for the linkpreview.net API", long_about = None)]
struct Args {
    /// Path to .env file (optional).
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load .env file if it exists
    if std::path::Path::new(&args.dotenv).exists() {
        dotenvy::from_path(&args.dotenv)?;
        eprintln!("Loaded environment from {}", args.dotenv);
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let tls = config.tls.clone();

    // Create application state
    let state = AppState::new(config)?;

    // Build router with middleware
    let app = router(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    query = request.uri().query().unwrap_or("")
                )
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    match tls {
        Some(tls) => {
            // Both aws-lc-rs (server) and ring (reqwest) are linked, so pick one explicitly.
            let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

            let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;
            let addr = tokio::net::lookup_host(&bind_addr)
                .await?
                .next()
                .ok_or_else(|| anyhow::anyhow!("could not resolve bind address {bind_addr}"))?;

            tracing::info!(addr = %addr, "starting proxy server (https)");
            axum_server::bind_rustls(addr, rustls_config)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            tracing::info!(addr = %bind_addr, "starting proxy server (http)");

            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

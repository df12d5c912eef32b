//! Test helpers: throwaway HTTP servers standing in for upstream services.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::post;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::cache::DayClock;
use crate::config::Config;

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A URL nothing is listening on.
pub async fn refused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// A server that answers with `Content-Length: 100`, sends 8 bytes and hangs up.
pub async fn truncated_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                read_request(&mut socket).await;
                let _ = socket
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n{\"title\"")
                    .await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}")
}

/// Drain one HTTP request (headers plus `Content-Length` body) from `socket`.
async fn read_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|len| len.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                return;
            }
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Mock link-preview API answering every POST with a fixed status and body.
pub struct MockUpstream {
    url: String,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<serde_json::Value>>>,
}

impl MockUpstream {
    pub async fn start(status: StatusCode, body: &'static str) -> Self {
        Self::start_with_delay(status, body, Duration::ZERO).await
    }

    pub async fn start_with_delay(status: StatusCode, body: &'static str, delay: Duration) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let last_request = Arc::new(Mutex::new(None));

        let app = {
            let hits = hits.clone();
            let last_request = last_request.clone();
            Router::new().route(
                "/",
                post(move |axum::Json(request): axum::Json<serde_json::Value>| {
                    let hits = hits.clone();
                    let last_request = last_request.clone();
                    async move {
                        hits.fetch_add(1, Ordering::SeqCst);
                        *last_request.lock().unwrap() = Some(request);
                        tokio::time::sleep(delay).await;
                        (status, body)
                    }
                }),
            )
        };

        let url = spawn_server(app).await;
        Self {
            url,
            hits,
            last_request,
        }
    }

    pub fn url(&self) -> String {
        self.url.clone()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<serde_json::Value> {
        self.last_request.lock().unwrap().clone()
    }
}

/// Configuration pointing at a test upstream, no TLS, no referrer gate.
pub fn test_config(linkpreview_url: &str) -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        linkpreview_key: "test-key".to_string(),
        linkpreview_url: linkpreview_url.to_string(),
        upstream_timeout: Duration::from_secs(5),
        tls: None,
        allowed_referer: String::new(),
        imageproxy_url: None,
    }
}

/// Day-of-month clock that tests can move forward.
pub struct ManualDay(AtomicU32);

impl ManualDay {
    pub fn new(day: u32) -> Self {
        Self(AtomicU32::new(day))
    }

    pub fn set(&self, day: u32) {
        self.0.store(day, Ordering::SeqCst);
    }
}

impl DayClock for ManualDay {
    fn day_of_month(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

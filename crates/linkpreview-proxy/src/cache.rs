//! In-memory response caching with moka.
//!
//! Upstream link-preview responses are cached per query and per calendar day.
//!
//! ## Cache Key Strategy
//!
//! A key is the raw `q` parameter followed by the day of the month on the
//! host-local clock, e.g. `https://example.com` on the 14th becomes
//! `https://example.com14`. The key rolls over at local midnight, so a
//! long-running process stops hitting yesterday's entries even before their
//! TTL fires.
//!
//! ## Expiry
//!
//! Every entry carries its own TTL (24 hours unless inserted with
//! [`ResponseCache::insert_with_ttl`]). There is no capacity bound: the key
//! space is only limited by TTL turnover, so a flood of distinct queries grows
//! the cache for up to a day.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use bytes::Bytes;
use chrono::Datelike;
use moka::Expiry;
use moka::future::Cache;

/// Default TTL for cached upstream responses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Upstream response as it is stored and replayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedResponse {
    /// Raw upstream body.
    pub body: Bytes,
    /// Upstream status code, success or not.
    pub status: StatusCode,
}

impl CachedResponse {
    pub fn new(body: impl Into<Bytes>, status: StatusCode) -> Self {
        Self {
            body: body.into(),
            status,
        }
    }
}

/// Source of the day-of-month used in cache keys.
pub trait DayClock: Send + Sync {
    /// Current day of the month, `1..=31`.
    fn day_of_month(&self) -> u32;
}

/// Host-local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalClock;

impl DayClock for LocalClock {
    fn day_of_month(&self) -> u32 {
        chrono::Local::now().day()
    }
}

/// Cache key: query string suffixed with the day of the month.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(query: &str, day_of_month: u32) -> Self {
        Self(format!("{query}{day_of_month}"))
    }

    /// Key for `query` on the clock's current day.
    pub fn today(query: &str, clock: &dyn DayClock) -> Self {
        Self::new(query, clock.day_of_month())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// Where a value returned by [`ResponseCache::get_or_fetch`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    /// Already in the cache (or inserted by a concurrent caller).
    Cached,
    /// Produced by this caller's fetch and inserted just now.
    Fetched,
}

#[derive(Clone, Debug)]
struct Stored {
    response: CachedResponse,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with.
struct PerEntryTtl;

impl Expiry<String, Stored> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Stored,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Stored,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Concurrent, TTL-expiring store of upstream responses.
///
/// Cloning is cheap; clones share the same underlying cache.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Cache<String, Stored>,
    default_ttl: Duration,
}

impl ResponseCache {
    /// Create a cache whose entries live for [`DEFAULT_TTL`].
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_TTL)
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        let inner = Cache::builder().expire_after(PerEntryTtl).build();
        Self { inner, default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get(&self, key: &str) -> Option<CachedResponse> {
        self.inner.get(key).await.map(|stored| stored.response)
    }

    /// Store `response` under `key` with the default TTL, replacing any
    /// existing entry.
    pub async fn insert(&self, key: impl Into<String>, response: CachedResponse) {
        self.insert_with_ttl(key, response, self.default_ttl).await;
    }

    pub async fn insert_with_ttl(
        &self,
        key: impl Into<String>,
        response: CachedResponse,
        ttl: Duration,
    ) {
        self.inner.insert(key.into(), Stored { response, ttl }).await;
    }

    /// Return the cached response for `key`, or run `fetch` and cache its
    /// result with the default TTL.
    ///
    /// Concurrent callers missing on the same key share a single `fetch`.
    /// An error from `fetch` is handed to every waiting caller and nothing is
    /// inserted.
    pub async fn get_or_fetch<F, E>(
        &self,
        key: impl Into<String>,
        fetch: F,
    ) -> Result<(CachedResponse, Freshness), Arc<E>>
    where
        F: Future<Output = Result<CachedResponse, E>>,
        E: Send + Sync + 'static,
    {
        let ttl = self.default_ttl;
        let entry = self
            .inner
            .entry(key.into())
            .or_try_insert_with(async move {
                fetch.await.map(|response| Stored { response, ttl })
            })
            .await?;

        let freshness = if entry.is_fresh() {
            Freshness::Fetched
        } else {
            Freshness::Cached
        };

        Ok((entry.into_value().response, freshness))
    }

    /// Whether a live entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Flush moka's pending housekeeping (evictions, counters).
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

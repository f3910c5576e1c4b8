//! Per-address token bucket rate limiting.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use resman_core::error::ResmanError;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::RateLimitConfig;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Tracked clients above which full buckets are dropped.
const PRUNE_AT: usize = 4096;

pub struct RateLimiter {
    buckets: Mutex<HashMap<String, Bucket>>,
    prune_at: usize,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_prune_threshold(PRUNE_AT)
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_prune_threshold(prune_at: usize) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            prune_at,
        }
    }

    /// Take one token from `key`'s bucket.
    pub async fn allow(&self, key: &str, cfg: &RateLimitConfig) -> bool {
        self.allow_at(key, cfg, Instant::now()).await
    }

    async fn allow_at(&self, key: &str, cfg: &RateLimitConfig, now: Instant) -> bool {
        let mut lock = self.buckets.lock().await;
        if lock.len() >= self.prune_at && !lock.contains_key(key) {
            // A refilled bucket is indistinguishable from a fresh one.
            lock.retain(|_, bucket| bucket.refilled(cfg, now) < cfg.capacity);
            debug!(tracked = lock.len(), "rate limit buckets pruned");
        }
        let bucket = lock.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: cfg.capacity,
            last_refill: now,
        });
        bucket.tokens = bucket.refilled(cfg, now);
        bucket.last_refill = now;
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

impl Bucket {
    fn refilled(&self, cfg: &RateLimitConfig, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        (self.tokens + elapsed * cfg.refill_per_sec).min(cfg.capacity)
    }
}

/// The peer address, or the first `x-forwarded-for` hop when the proxy
/// in front is trusted to set it.
fn client_key(req: &Request<Body>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        if let Some(forwarded) = req
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return forwarded.to_string();
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let cfg = &state.rate_limit;
    if cfg.capacity > 0.0 {
        let key = client_key(&req, cfg.trust_forwarded_for);
        if !state.limiter.allow(&key, cfg).await {
            debug!(client = %key, "rate limited");
            return ApiError(ResmanError::RateLimited).into_response();
        }
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn cfg(capacity: f64, refill_per_sec: f64) -> RateLimitConfig {
        RateLimitConfig {
            capacity,
            refill_per_sec,
            trust_forwarded_for: false,
        }
    }

    #[tokio::test]
    async fn bucket_drains_then_refills() {
        let limiter = RateLimiter::new();
        let cfg = cfg(2.0, 1.0);
        let start = Instant::now();

        assert!(limiter.allow_at("a", &cfg, start).await);
        assert!(limiter.allow_at("a", &cfg, start).await);
        assert!(!limiter.allow_at("a", &cfg, start).await);

        let later = start + Duration::from_millis(1100);
        assert!(limiter.allow_at("a", &cfg, later).await);
        assert!(!limiter.allow_at("a", &cfg, later).await);
    }

    #[tokio::test]
    async fn clients_have_separate_buckets() {
        let limiter = RateLimiter::new();
        let cfg = cfg(1.0, 0.0);
        let now = Instant::now();

        assert!(limiter.allow_at("a", &cfg, now).await);
        assert!(!limiter.allow_at("a", &cfg, now).await);
        assert!(limiter.allow_at("b", &cfg, now).await);
    }

    #[tokio::test]
    async fn refilled_buckets_are_pruned_past_the_threshold() {
        let limiter = RateLimiter::with_prune_threshold(3);
        let cfg = cfg(1.0, 1.0);
        let start = Instant::now();

        for key in ["a", "b", "c"] {
            assert!(limiter.allow_at(key, &cfg, start).await);
        }
        assert_eq!(limiter.tracked().await, 3);

        // "c" is still empty a moment later; "a" and "b" refill by then.
        let soon = start + Duration::from_millis(10);
        assert!(!limiter.allow_at("c", &cfg, soon).await);
        let later = start + Duration::from_secs(2);
        assert!(limiter.allow_at("d", &cfg, later).await);
        assert_eq!(limiter.tracked().await, 1);
    }

    #[tokio::test]
    async fn drained_buckets_survive_pruning() {
        let limiter = RateLimiter::with_prune_threshold(2);
        let cfg = cfg(1.0, 0.0);
        let now = Instant::now();

        assert!(limiter.allow_at("a", &cfg, now).await);
        assert!(limiter.allow_at("b", &cfg, now).await);
        assert!(limiter.allow_at("c", &cfg, now).await);
        assert!(!limiter.allow_at("a", &cfg, now).await);
    }

    fn request(forwarded: &str, peer: [u8; 4]) -> Request<Body> {
        let mut req = Request::builder()
            .header("x-forwarded-for", forwarded)
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 4000))));
        req
    }

    #[test]
    fn peer_address_is_the_default_key() {
        let first = request("203.0.113.7", [192, 0, 2, 1]);
        let second = request("203.0.113.8", [192, 0, 2, 1]);
        assert_eq!(client_key(&first, false), "192.0.2.1");
        assert_eq!(client_key(&second, false), "192.0.2.1");

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&bare, false), "unknown");
    }

    #[test]
    fn trusted_forwarded_header_wins() {
        let req = request("203.0.113.7, 10.0.0.1", [10, 0, 0, 1]);
        assert_eq!(client_key(&req, true), "203.0.113.7");

        let blank = request(" ", [10, 0, 0, 1]);
        assert_eq!(client_key(&blank, true), "10.0.0.1");
    }
}

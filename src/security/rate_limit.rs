//! Fixed-window request limiter guarding idempotency-sensitive routes.
//!
//! # Responsibilities
//! - Count requests per (method, URI, client IP) within a window
//! - Reject with 429 and a retry hint once the window is full
//! - Sweep stale windows in the background
//!
//! # Design Decisions
//! - Windows are fixed, not sliding: the first request opens a window and
//!   the counter resets once it has elapsed
//! - Missing connection info (in-process tests) keys by "unknown"

use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, OriginalUri, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use tokio::task::JoinHandle;

use crate::config::RateLimitConfig;
use crate::http::error::AppError;
use crate::observability::metrics;
use crate::registry::Token;

pub const RATE_LIMITER: Token<RateLimiter> = Token::new("RateLimiter");

#[derive(Debug, Clone, Copy)]
struct Window {
    opened: Instant,
    count: u32,
}

/// Shared limiter state.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    window: Duration,
    max_requests: u32,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            window: Duration::from_millis(config.window_ms),
            max_requests: config.max_requests,
            enabled: config.enabled,
        }
    }

    pub fn key(method: &str, uri: &str, client: &str) -> String {
        format!("{method}-{uri}-{client}")
    }

    /// Count a request at `now`. `Err` carries the seconds until the
    /// window reopens.
    pub fn check(&self, key: &str, now: Instant) -> Result<(), u64> {
        if !self.enabled {
            return Ok(());
        }

        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            opened: now,
            count: 0,
        });
        let window = entry.value_mut();

        if now.duration_since(window.opened) >= self.window {
            window.opened = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            let remaining = (window.opened + self.window).saturating_duration_since(now);
            return Err(remaining.as_millis().div_ceil(1000) as u64);
        }

        window.count += 1;
        Ok(())
    }

    /// Drop windows that have fully elapsed. Returns how many were removed.
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.duration_since(window.opened) < self.window);
        before - self.windows.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Sweep every two windows until the limiter is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.window.saturating_mul(2).max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(limiter) = weak.upgrade() else {
                    break;
                };
                let removed = limiter.sweep(Instant::now());
                if removed > 0 {
                    tracing::debug!(removed, "Swept stale rate-limit windows");
                }
            }
        })
    }
}

/// Middleware function for the fixed-window limiter.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    // Nested routers see a stripped URI; key on what the client sent.
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.clone())
        .unwrap_or_else(|| request.uri().clone());
    let key = RateLimiter::key(request.method().as_str(), &uri.to_string(), &client);

    match limiter.check(&key, Instant::now()) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!(client = %client, path = %uri.path(), retry_after, "Rate limit exceeded");
            metrics::record_rate_limited(uri.path());
            AppError::too_many_requests(retry_after).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            enabled: true,
            window_ms: 10_000,
            max_requests,
        })
    }

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let limiter = limiter(2);
        let start = Instant::now();

        assert!(limiter.check("k", start).is_ok());
        assert!(limiter.check("k", start).is_ok());
        assert_eq!(limiter.check("k", start + Duration::from_millis(2_500)), Err(8));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = limiter(1);
        let now = Instant::now();

        assert!(limiter.check("POST-/auth/register-1.1.1.1", now).is_ok());
        assert!(limiter.check("POST-/auth/register-2.2.2.2", now).is_ok());
        assert!(limiter.check("POST-/auth/register-1.1.1.1", now).is_err());
    }

    #[test]
    fn test_window_resets_after_elapsing() {
        let limiter = limiter(1);
        let start = Instant::now();

        assert!(limiter.check("k", start).is_ok());
        assert!(limiter.check("k", start + Duration::from_secs(5)).is_err());
        assert!(limiter.check("k", start + Duration::from_secs(10)).is_ok());
    }

    #[test]
    fn test_sweep_drops_stale_windows() {
        let limiter = limiter(5);
        let start = Instant::now();
        limiter.check("old", start).unwrap();
        limiter.check("fresh", start + Duration::from_secs(9)).unwrap();

        assert_eq!(limiter.sweep(start + Duration::from_secs(11)), 1);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_disabled_never_limits() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            enabled: false,
            window_ms: 10_000,
            max_requests: 1,
        });
        let now = Instant::now();
        for _ in 0..5 {
            assert!(limiter.check("k", now).is_ok());
        }
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_key_format() {
        assert_eq!(
            RateLimiter::key("POST", "/auth/register", "127.0.0.1"),
            "POST-/auth/register-127.0.0.1"
        );
    }
}

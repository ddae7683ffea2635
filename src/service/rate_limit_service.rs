//! Rate Limiting Service
//!
//! In-memory fixed-window limiter keyed by client address. Each key gets
//! `max_requests` requests per window; the counter resets when the window
//! that started with the key's first request has elapsed.

use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

use axum::http::HeaderMap;

use crate::config::RateLimitConfig;
use crate::utils::error::AppError;

/// Keys are dropped once the map grows past this and their window is over.
/// A purge runs at most once per window.
const PURGE_THRESHOLD: usize = 10_000;

/// Rate limiting specific errors
#[derive(Error, Debug, PartialEq)]
pub enum RateLimitError {
    #[error("Too many requests, retry in {retry_after} seconds")]
    RateLimitExceeded { key: String, retry_after: u64 },
}

impl From<RateLimitError> for AppError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::RateLimitExceeded { retry_after, .. } => AppError::RateLimit {
                message: "Too many requests".to_string(),
                retry_after,
            },
        }
    }
}

/// Result type for rate limiting operations
pub type RateLimitResult<T> = Result<T, RateLimitError>;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Rate limiting service implementation
pub struct RateLimitService {
    max_requests: u32,
    window: Duration,
    windows: DashMap<String, Window>,
    last_purge: Mutex<Option<Instant>>,
}

impl RateLimitService {
    /// Limiter allowing `max_requests` per `window` for each key
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: DashMap::new(),
            last_purge: Mutex::new(None),
        }
    }

    /// Per-minute limiter for the current-user endpoint
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.me_per_minute, Duration::from_secs(60))
    }

    /// Records one request for `key`, failing once the window's budget is spent
    pub fn check(&self, key: &str) -> RateLimitResult<()> {
        self.check_at(key, Instant::now())
    }

    pub(crate) fn check_at(&self, key: &str, now: Instant) -> RateLimitResult<()> {
        if self.windows.len() > PURGE_THRESHOLD && self.purge_due(now) {
            self.purge_expired(now);
        }

        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            let remaining = self.window.saturating_sub(elapsed);
            let retry_after = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            log::warn!("Rate limit exceeded for {}", key);
            return Err(RateLimitError::RateLimitExceeded {
                key: key.to_string(),
                retry_after: retry_after.max(1),
            });
        }

        entry.count += 1;
        Ok(())
    }

    /// Claims the next purge if a window has passed since the last one.
    /// A concurrent caller already holding the lock skips it.
    fn purge_due(&self, now: Instant) -> bool {
        let Ok(mut last_purge) = self.last_purge.try_lock() else {
            return false;
        };

        match *last_purge {
            Some(last) if now.saturating_duration_since(last) < self.window => false,
            _ => {
                *last_purge = Some(now);
                true
            }
        }
    }

    /// Drops keys whose window has ended
    pub fn purge_expired(&self, now: Instant) {
        let window = self.window;
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < window);
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// Client key: first `X-Forwarded-For` hop, else the peer address
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

//! Sliding-window rate limiting keyed by caller address

use axum::http::HeaderMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::RateLimitConfig;
use crate::error::AppError;

#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self::with_limits(config.max_requests, config.window())
    }

    pub fn with_limits(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records the attempt when allowed. A denied attempt still prunes the
    /// caller's history but is not recorded.
    pub fn check(&self, caller: &str) -> Result<(), RateLimitError> {
        let now = Instant::now();
        let mut requests = self.requests.lock();

        let entries = requests.entry(caller.to_string()).or_default();

        entries.retain(|&instant| now.duration_since(instant) < self.window);

        if entries.len() >= self.max_requests {
            let oldest = entries.first().copied().unwrap_or(now);
            let reset_in = self.window.saturating_sub(now.duration_since(oldest));

            // Round up; Retry-After must never be early.
            let retry_after_seconds = reset_in.as_secs() + u64::from(reset_in.subsec_nanos() > 0);

            return Err(RateLimitError {
                retry_after_seconds: retry_after_seconds.max(1),
                limit: self.max_requests,
            });
        }

        entries.push(now);

        Ok(())
    }

    /// Drops expired timestamps for every caller and forgets callers with
    /// none left. Returns how many callers remain tracked.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut requests = self.requests.lock();

        requests.retain(|_, entries| {
            entries.retain(|&instant| now.duration_since(instant) < self.window);
            !entries.is_empty()
        });

        requests.len()
    }

    pub fn tracked_callers(&self) -> usize {
        self.requests.lock().len()
    }

    /// Runs [`RateLimiter::prune`] once per window for the life of the runtime.
    pub fn spawn_pruner(&self) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(limiter.window);
            interval.tick().await;
            loop {
                interval.tick().await;
                let remaining = limiter.prune();
                tracing::debug!(tracked_callers = remaining, "Pruned rate limiter table");
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitError {
    pub retry_after_seconds: u64,
    pub limit: usize,
}

impl From<RateLimitError> for AppError {
    fn from(err: RateLimitError) -> Self {
        AppError::RateLimited {
            retry_after_seconds: err.retry_after_seconds,
        }
    }
}

/// Partition key for the limiter. Behind a trusted proxy the leftmost
/// forwarded address is the client.
pub fn caller_id(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(ip) = forwarded.or(real_ip) {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

//! Rate limiting middleware with per-class fixed windows.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitClassConfig;
use crate::http::error::ApiError;

/// One counter: the window it belongs to and the requests seen in it.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    window: u64,
    count: u32,
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub retry_after: Option<Duration>,
}

/// A fixed-window rate limiter for one endpoint class.
///
/// Window boundaries are deterministic (`floor(now / window_secs)`), so
/// a burst straddling a boundary can see up to twice the ceiling. That
/// is the accepted approximation of the fixed-window scheme, not a bug.
pub struct RateLimiter {
    name: &'static str,
    max_requests: u32,
    window_secs: u64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(name: &'static str, config: RateLimitClassConfig) -> Self {
        Self {
            name,
            max_requests: config.max_requests,
            window_secs: config.window_secs,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Check (and count) one request for a client key. Rejections do not
    /// increment the counter. Never errors.
    pub fn check(&self, key: &str) -> Decision {
        let now = Self::now_secs();
        let window = now / self.window_secs;

        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let bucket = buckets
            .entry(key.to_string())
            .or_insert(Bucket { window, count: 0 });

        if bucket.window != window {
            bucket.window = window;
            bucket.count = 0;
        }

        if bucket.count >= self.max_requests {
            let next_window_starts = (window + 1) * self.window_secs;
            let retry_after = next_window_starts.saturating_sub(now).max(1);
            Decision {
                allowed: false,
                retry_after: Some(Duration::from_secs(retry_after)),
            }
        } else {
            bucket.count += 1;
            Decision {
                allowed: true,
                retry_after: None,
            }
        }
    }

    /// Drop every bucket. Administrative/test-only operation.
    pub fn clear(&self) {
        self.buckets
            .lock()
            .expect("rate limiter mutex poisoned")
            .clear();
    }
}

/// The three limiter classes of the API surface.
#[derive(Clone)]
pub struct RateLimiters {
    /// Login/registration (tightest).
    pub auth: Arc<RateLimiter>,
    /// Reads and benign updates (loosest).
    pub general: Arc<RateLimiter>,
    /// Money movement and account deletion.
    pub strict: Arc<RateLimiter>,
}

impl RateLimiters {
    pub fn from_config(config: &crate::config::schema::RateLimitConfig) -> Self {
        Self {
            auth: Arc::new(RateLimiter::new("auth", config.auth)),
            general: Arc::new(RateLimiter::new("general", config.general)),
            strict: Arc::new(RateLimiter::new("strict", config.strict)),
        }
    }

    pub fn clear_all(&self) {
        self.auth.clear();
        self.general.clear();
        self.strict.clear();
    }
}

/// Middleware: short-circuit with 429 and a retry hint when the class
/// ceiling is hit.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = addr.ip().to_string();
    let decision = limiter.check(&key);

    if decision.allowed {
        next.run(request).await
    } else {
        let retry_after = decision.retry_after.unwrap_or(Duration::from_secs(1));
        tracing::warn!(
            client = %key,
            class = limiter.name(),
            retry_after_secs = retry_after.as_secs(),
            "rate limit exceeded"
        );
        ApiError::RateLimited {
            retry_after_secs: retry_after.as_secs(),
        }
        .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(
            "test",
            RateLimitClassConfig {
                max_requests,
                window_secs,
            },
        )
    }

    #[test]
    fn test_ceiling_is_enforced() {
        let limiter = limiter(3, 3600);

        for _ in 0..3 {
            assert!(limiter.check("1.2.3.4").allowed);
        }

        let decision = limiter.check("1.2.3.4");
        assert!(!decision.allowed);
        assert!(decision.retry_after.unwrap() >= Duration::from_secs(1));
    }

    #[test]
    fn test_clients_are_isolated() {
        let limiter = limiter(1, 3600);

        assert!(limiter.check("1.2.3.4").allowed);
        assert!(!limiter.check("1.2.3.4").allowed);
        assert!(limiter.check("5.6.7.8").allowed);
    }

    #[test]
    fn test_window_elapse_admits_again() {
        let limiter = limiter(1, 1);

        assert!(limiter.check("1.2.3.4").allowed);
        // Burn through the rest of this one-second window.
        std::thread::sleep(Duration::from_millis(1100));
        assert!(limiter.check("1.2.3.4").allowed);
    }

    #[test]
    fn test_rejections_do_not_extend_the_window() {
        let limiter = limiter(2, 3600);

        assert!(limiter.check("k").allowed);
        assert!(limiter.check("k").allowed);
        for _ in 0..10 {
            let decision = limiter.check("k");
            assert!(!decision.allowed);
            // The retry hint points at the window boundary and never
            // grows with repeated rejected attempts.
            assert!(decision.retry_after.unwrap() <= Duration::from_secs(3600));
        }
    }

    #[test]
    fn test_clear_resets_all_buckets() {
        let limiter = limiter(1, 3600);

        assert!(limiter.check("1.2.3.4").allowed);
        assert!(!limiter.check("1.2.3.4").allowed);

        limiter.clear();
        assert!(limiter.check("1.2.3.4").allowed);
    }
}

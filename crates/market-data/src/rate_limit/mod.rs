//! Fixed-window request rate limiter.
//!
//! Each `scope:client` key gets a counter that lives for one window. The
//! counter store is injected (see [`CounterStore`]) so a single instance can
//! use the in-process [`MemoryCounterStore`] while a multi-instance deployment
//! plugs in a shared store. Expired counters are swept opportunistically, at
//! most once every five minutes, from inside [`RateLimiter::check`].
//!
//! This is an abuse deterrent, not a security boundary: rotating identifying
//! headers yields a fresh budget.

mod client;
mod store;

pub use client::client_identifier;
pub use store::{Clock, CounterEntry, CounterStore, ManualClock, MemoryCounterStore, SystemClock};

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use reqwest::header::HeaderMap;
use serde::Serialize;

/// Minimum time between two sweeps of expired counters.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Immutable policy for one call scope.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RateLimitOptions {
    pub window: Duration,
    pub max_requests: u32,
}

impl RateLimitOptions {
    /// Create a policy. `max_requests` is raised to 1 if zero.
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests: max_requests.max(1),
        }
    }

    /// `max_requests` per one-minute window.
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(Duration::from_secs(60), max_requests)
    }

    fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Outcome of a single [`RateLimiter::check`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Epoch milliseconds at which the current window ends.
    pub reset_at: i64,
    /// Seconds to wait before retrying; 0 when allowed.
    pub retry_after_seconds: u64,
}

impl RateLimitResult {
    /// Response headers describing this decision.
    ///
    /// Always includes `X-RateLimit-Limit`, `X-RateLimit-Remaining` and
    /// `X-RateLimit-Reset` (epoch seconds); rejections add `Retry-After`.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("X-RateLimit-Limit", self.limit.to_string()),
            ("X-RateLimit-Remaining", self.remaining.to_string()),
            (
                "X-RateLimit-Reset",
                self.reset_at.div_euclid(1000).to_string(),
            ),
        ];
        if !self.allowed {
            headers.push(("Retry-After", self.retry_after_seconds.to_string()));
        }
        headers
    }
}

/// Per-scope, per-client fixed-window limiter.
///
/// The read-modify-write of a counter runs under one lock, so concurrent
/// checks on a multi-threaded runtime never push a key past its limit.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    /// Serialises check() and holds the time of the last sweep.
    last_sweep: Mutex<i64>,
}

impl RateLimiter {
    /// Create a limiter over an in-memory store and the system clock.
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryCounterStore::new()), Arc::new(SystemClock))
    }

    /// Create a limiter with an injected store and clock.
    pub fn with_store(store: Arc<dyn CounterStore>, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_millis();
        Self {
            store,
            clock,
            last_sweep: Mutex::new(now),
        }
    }

    /// Lock the limiter, recovering from poison if necessary.
    ///
    /// A poisoned lock only means a previous check panicked mid-update; the
    /// worst case is one miscounted request.
    fn lock(&self) -> MutexGuard<'_, i64> {
        self.last_sweep.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Count one request for `client` in `scope` and decide whether to allow it.
    pub fn check(
        &self,
        scope: &str,
        client: &str,
        options: &RateLimitOptions,
    ) -> RateLimitResult {
        let mut last_sweep = self.lock();
        let now = self.clock.now_millis();

        if now.saturating_sub(*last_sweep) >= CLEANUP_INTERVAL.as_millis() as i64 {
            let removed = self.store.sweep_expired(now);
            debug!("Rate limiter sweep removed {} expired counters", removed);
            *last_sweep = now;
        }

        let key = format!("{}:{}", scope, client);
        let limit = options.max_requests;

        match self.store.get(&key) {
            Some(mut entry) if now < entry.reset_at => {
                if entry.count < limit {
                    entry.count += 1;
                    self.store.set(&key, entry);
                    RateLimitResult {
                        allowed: true,
                        limit,
                        remaining: limit - entry.count,
                        reset_at: entry.reset_at,
                        retry_after_seconds: 0,
                    }
                } else {
                    let wait_ms = (entry.reset_at - now).max(0) as u64;
                    let retry_after_seconds = wait_ms.div_ceil(1000).max(1);
                    debug!(
                        "Rate limit exceeded for '{}', retry after {}s",
                        key, retry_after_seconds
                    );
                    RateLimitResult {
                        allowed: false,
                        limit,
                        remaining: 0,
                        reset_at: entry.reset_at,
                        retry_after_seconds,
                    }
                }
            }
            _ => {
                let entry = CounterEntry {
                    count: 1,
                    reset_at: now.saturating_add(options.window_ms()),
                };
                self.store.set(&key, entry);
                RateLimitResult {
                    allowed: true,
                    limit,
                    remaining: limit - 1,
                    reset_at: entry.reset_at,
                    retry_after_seconds: 0,
                }
            }
        }
    }

    /// Derive the client identifier from request headers, then [`check`](Self::check).
    pub fn check_headers(
        &self,
        scope: &str,
        headers: &HeaderMap,
        options: &RateLimitOptions,
    ) -> RateLimitResult {
        let client = client_identifier(headers);
        self.check(scope, &client, options)
    }

    /// Forget the counter for one key.
    pub fn reset(&self, scope: &str, client: &str) {
        let _guard = self.lock();
        self.store.delete(&format!("{}:{}", scope, client));
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

//! Per-key fixed-window rate limiting.
//!
//! Each key owns one window holding a request count and an expiry. The first
//! request after expiry replaces the window with a fresh one (count = 1).
//!
//! This is a fixed-window counter, not a sliding window or token bucket:
//! a client may spend its whole budget at the start of a window, and up to
//! twice the budget across a window boundary. Budgets here are hourly and
//! generous, so the boundary burst is accepted as is.
//!
//! State lives in this process only. Running several gateway processes
//! gives each its own budget; sharing one would need an external store.

use std::fmt;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Budget applied to a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub max_requests: u32,
    pub window: Duration,
}

/// Key under which a client's budget is tracked for one route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey(String);

impl RateLimitKey {
    /// Namespaced key, e.g. `chat:198.51.100.7`.
    pub fn new(namespace: &str, identity: &str) -> Self {
        Self(format!("{namespace}:{identity}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of a single rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub success: bool,
    pub remaining: u32,
    pub reset_in: Duration,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, rounded up and at least 1.
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.reset_in.as_secs();
        let secs = if self.reset_in.subsec_nanos() > 0 { secs + 1 } else { secs };
        secs.max(1)
    }
}

#[derive(Debug)]
struct RateLimitWindow {
    count: u32,
    expires_at: Instant,
}

/// Process-wide fixed-window rate limiter.
///
/// The per-key entry lock of the map makes each check an atomic
/// read-increment-compare, so concurrent requests for the same key never
/// over-admit.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<String, RateLimitWindow>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request against `key` and decide whether to admit it.
    pub fn check(&self, key: &RateLimitKey, rule: RateLimitRule) -> RateLimitDecision {
        self.check_at(key, rule, Instant::now())
    }

    /// Same as [`RateLimiter::check`], evaluated at `now`.
    pub fn check_at(
        &self,
        key: &RateLimitKey,
        rule: RateLimitRule,
        now: Instant,
    ) -> RateLimitDecision {
        let mut window = self
            .windows
            .entry(key.as_str().to_owned())
            .or_insert_with(|| RateLimitWindow { count: 0, expires_at: now });

        if now >= window.expires_at {
            window.count = 1;
            window.expires_at = now + rule.window;
            return RateLimitDecision {
                success: true,
                remaining: rule.max_requests.saturating_sub(1),
                reset_in: rule.window,
            };
        }

        let next = window.count.saturating_add(1);
        let success = next <= rule.max_requests;
        if success {
            window.count = next;
        }

        RateLimitDecision {
            success,
            remaining: rule.max_requests.saturating_sub(window.count),
            reset_in: window.expires_at.saturating_duration_since(now),
        }
    }

    /// Drop every window that has already expired. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub fn sweep_expired_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| window.expires_at > now);
        before.saturating_sub(self.windows.len())
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

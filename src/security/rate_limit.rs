//! Per-identifier sliding window rate limiter.
//!
//! The map of identifier → timestamps is owned by the limiter and guarded by a
//! mutex, so one identifier's check-and-record is atomic across worker threads.
//! Once more than `max_identifiers` keys are tracked the whole map is cleared,
//! which resets every quota at once. That is an intentional memory valve, not
//! an eviction policy.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::config::RateLimitConfig;

/// Clock abstraction so window arithmetic can be faked in tests.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now_millis(&self) -> u64;
}

/// Wall clock in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_millis)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Sliding window limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: usize,
    pub window: Duration,
    pub max_identifiers: usize,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
            max_identifiers: 1000,
        }
    }
}

impl From<&RateLimitConfig> for RateLimitPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            max_identifiers: config.max_identifiers,
        }
    }
}

/// In-memory rate limiter keyed by caller identifier.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Vec<u64>>>,
    policy: RateLimitPolicy,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Check and record one call for `identifier` at the clock's current time.
    pub fn allow(&self, identifier: &str) -> bool {
        self.allow_at(identifier, self.clock.now_millis())
    }

    /// Check and record one call for `identifier` at `now` (epoch millis).
    pub fn allow_at(&self, identifier: &str, now: u64) -> bool {
        let window = u64::try_from(self.policy.window.as_millis()).unwrap_or(u64::MAX);
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        let timestamps = windows.entry(identifier.to_string()).or_default();
        timestamps.retain(|&t| now.saturating_sub(t) < window);

        let allowed = timestamps.len() < self.policy.max_requests;
        if allowed {
            timestamps.push(now);
        }

        if windows.len() > self.policy.max_identifiers {
            tracing::debug!(
                tracked = windows.len(),
                max_identifiers = self.policy.max_identifiers,
                "Rate limit map over capacity, clearing"
            );
            windows.clear();
        }

        allowed
    }

    /// Number of identifiers currently tracked.
    pub fn tracked(&self) -> usize {
        self.windows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitPolicy::default())
    }
}

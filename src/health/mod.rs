//! Per-provider health records and circuit breaking.
//!
//! One mutable [`HealthRecord`] exists per provider for the lifetime of the
//! process. Every state transition is driven by an observed call outcome;
//! there is no background probing. The breaker is time-boxed: a `Failed`
//! provider becomes eligible again after the cooldown elapses, reset lazily
//! inside the next eligibility check.
//!
//! State machine:
//!
//! ```text
//! Healthy <-> Degraded -> Failed -> (cooldown elapses) -> Healthy
//!       * -> RateLimited -> (reset time elapses) -> Healthy
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::config::RouterConfig;
use crate::types::{ProviderSnapshot, ProviderStatus};

/// Injectable time source for deterministic cooldown/rate-limit tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall-clock time (the production default).
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// A manual clock starting at the unix epoch.
    pub fn at_epoch() -> Self {
        Self::new(UNIX_EPOCH)
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.now
            .lock()
            .map(|t| *t)
            .unwrap_or(UNIX_EPOCH)
    }
}

/// Mutable health state for one provider.
#[derive(Debug, Clone)]
pub struct HealthRecord {
    pub status: ProviderStatus,
    pub last_checked_at: SystemTime,
    /// Moving average, updated `(old + new) / 2` on success.
    pub mean_response_time: Duration,
    pub success_count: u64,
    pub error_count: u64,
    pub consecutive_failures: u32,
    /// While in the future, the provider sits out of selection.
    pub rate_limit_reset_at: Option<SystemTime>,
}

impl HealthRecord {
    fn new(now: SystemTime) -> Self {
        Self {
            status: ProviderStatus::Healthy,
            last_checked_at: now,
            mean_response_time: Duration::ZERO,
            success_count: 0,
            error_count: 0,
            consecutive_failures: 0,
            rate_limit_reset_at: None,
        }
    }
}

/// Tracks health for every registered provider.
///
/// Each record sits behind its own mutex; the critical sections are fast
/// in-memory updates and are never held across I/O.
pub struct HealthTracker {
    records: HashMap<String, Mutex<HealthRecord>>,
    clock: Arc<dyn Clock>,
    failure_threshold: u32,
    failure_cooldown: Duration,
}

impl HealthTracker {
    pub fn new<I, S>(provider_names: I, clock: Arc<dyn Clock>, config: &RouterConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = clock.now();
        let records = provider_names
            .into_iter()
            .map(|name| (name.into(), Mutex::new(HealthRecord::new(now))))
            .collect();
        Self {
            records,
            clock,
            failure_threshold: config.failure_threshold,
            failure_cooldown: config.failure_cooldown,
        }
    }

    fn with_record<R>(&self, provider: &str, f: impl FnOnce(&mut HealthRecord) -> R) -> Option<R> {
        let record = self.records.get(provider)?;
        record.lock().ok().map(|mut rec| f(&mut rec))
    }

    /// Record a successful call. Success is restorative: it resets the
    /// consecutive-failure count and restores `Healthy`, except while an
    /// unexpired rate-limit window is active, where only counters update.
    pub fn record_success(&self, provider: &str, elapsed: Duration) {
        let now = self.clock.now();
        self.with_record(provider, |rec| {
            rec.success_count += 1;
            rec.consecutive_failures = 0;
            rec.mean_response_time = (rec.mean_response_time + elapsed) / 2;
            rec.last_checked_at = now;

            let limited = rec.status == ProviderStatus::RateLimited
                && rec.rate_limit_reset_at.map_or(false, |reset| now < reset);
            if !limited {
                rec.status = ProviderStatus::Healthy;
                rec.rate_limit_reset_at = None;
            }
        });
    }

    /// Record a failed call (non-2xx other than 429, timeout, transport
    /// error, or malformed response). Opens the breaker at the threshold.
    pub fn record_failure(&self, provider: &str) {
        let now = self.clock.now();
        let threshold = self.failure_threshold;
        let opened = self.with_record(provider, |rec| {
            rec.error_count += 1;
            rec.consecutive_failures = rec.consecutive_failures.saturating_add(1);
            rec.last_checked_at = now;
            if rec.consecutive_failures >= threshold {
                rec.status = ProviderStatus::Failed;
                true
            } else {
                rec.status = ProviderStatus::Degraded;
                false
            }
        });
        if opened == Some(true) {
            debug!(provider, "circuit opened after consecutive failures");
        }
    }

    /// Record a 429. Tracked separately from generic failure so legitimate
    /// throttling does not trip the breaker.
    pub fn record_rate_limited(&self, provider: &str, retry_after: Duration) {
        let now = self.clock.now();
        self.with_record(provider, |rec| {
            rec.status = ProviderStatus::RateLimited;
            rec.rate_limit_reset_at = Some(now + retry_after);
            rec.last_checked_at = now;
        });
        debug!(provider, ?retry_after, "provider rate limited");
    }

    /// Whether a provider may be selected right now.
    ///
    /// `Failed` records whose cooldown has elapsed are eagerly reset to
    /// `Healthy` here (lazy recovery); likewise expired rate-limit windows.
    /// Unknown providers are never eligible.
    pub fn is_eligible(&self, provider: &str) -> bool {
        let now = self.clock.now();
        let cooldown = self.failure_cooldown;
        self.with_record(provider, |rec| match rec.status {
            ProviderStatus::Healthy | ProviderStatus::Degraded => true,
            ProviderStatus::RateLimited => match rec.rate_limit_reset_at {
                Some(reset) if now < reset => false,
                _ => {
                    rec.status = ProviderStatus::Healthy;
                    rec.rate_limit_reset_at = None;
                    true
                }
            },
            ProviderStatus::Failed => {
                let since = now
                    .duration_since(rec.last_checked_at)
                    .unwrap_or(Duration::ZERO);
                if since > cooldown {
                    rec.status = ProviderStatus::Healthy;
                    rec.consecutive_failures = 0;
                    debug!(provider, "circuit cooldown elapsed, provider restored");
                    true
                } else {
                    false
                }
            }
        })
        .unwrap_or(false)
    }

    /// Current record for one provider, if registered.
    pub fn record(&self, provider: &str) -> Option<HealthRecord> {
        self.with_record(provider, |rec| rec.clone())
    }

    /// Point-in-time snapshot of every provider, for observability surfaces.
    pub fn snapshots(&self) -> HashMap<String, ProviderSnapshot> {
        self.records
            .keys()
            .filter_map(|name| {
                self.record(name)
                    .map(|rec| (name.clone(), snapshot_from(&rec)))
            })
            .collect()
    }
}

fn snapshot_from(rec: &HealthRecord) -> ProviderSnapshot {
    let attempts = rec.success_count + rec.error_count;
    ProviderSnapshot {
        status: rec.status,
        success_count: rec.success_count,
        error_count: rec.error_count,
        mean_response_time_ms: rec.mean_response_time.as_millis() as u64,
        last_checked_at: rec
            .last_checked_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs(),
        success_rate: rec.success_count as f64 / attempts.max(1) as f64,
    }
}

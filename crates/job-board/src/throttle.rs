//! Keyed rate limiting.
//!
//! Callers depend on the [`RateLimiter`] capability; the in-process [`QuotaRateLimiter`] only
//! limits a single instance, so multi-instance deployments supply a limiter backed by a shared
//! expiring store.

use std::num::NonZeroU32;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use governor::middleware::NoOpMiddleware;
use governor::nanos::Nanos;
use governor::state::keyed::HashMapStateStore;
use governor::Quota;

use crate::clock::{Clock, SystemClock};

pub trait RateLimiter: Send + Sync {
    /// Records an attempt for `key` and reports whether it is within the limit.
    fn check_and_record(&self, key: &str) -> bool;
}

/// Limiter that never refuses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn check_and_record(&self, _key: &str) -> bool {
        true
    }
}

/// Feeds the board clock into governor as nanoseconds elapsed since the limiter was built.
#[derive(Clone)]
struct BoardClock {
    clock: Arc<dyn Clock>,
    origin: DateTime<Utc>,
}

impl governor::clock::Clock for BoardClock {
    type Instant = Nanos;

    fn now(&self) -> Nanos {
        let elapsed = (self.clock.now() - self.origin)
            .to_std()
            .unwrap_or_default();
        Nanos::from(elapsed)
    }
}

type KeyedLimiter =
    governor::RateLimiter<String, HashMapStateStore<String>, BoardClock, NoOpMiddleware<Nanos>>;

enum Policy {
    RefuseAll,
    AllowAll,
    Limited(KeyedLimiter),
}

/// Per-key quota: bursts of up to `max_hits` attempts, replenished evenly across `window`.
pub struct QuotaRateLimiter {
    policy: Policy,
}

impl QuotaRateLimiter {
    pub fn new(max_hits: u32, window: Duration) -> Self {
        Self::with_clock(max_hits, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_hits: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let Some(burst) = NonZeroU32::new(max_hits) else {
            return Self {
                policy: Policy::RefuseAll,
            };
        };
        let quota = window
            .to_std()
            .ok()
            .and_then(|window| Quota::with_period(window / max_hits))
            .map(|quota| quota.allow_burst(burst));

        let policy = match quota {
            Some(quota) => {
                let origin = clock.now();
                let clock = BoardClock { clock, origin };
                Policy::Limited(governor::RateLimiter::hashmap_with_clock(quota, &clock))
            }
            // an empty window never accumulates attempts
            None => Policy::AllowAll,
        };
        Self { policy }
    }
}

impl RateLimiter for QuotaRateLimiter {
    fn check_and_record(&self, key: &str) -> bool {
        match &self.policy {
            Policy::RefuseAll => false,
            Policy::AllowAll => true,
            Policy::Limited(limiter) => {
                let allowed = limiter.check_key(&key.to_string()).is_ok();
                limiter.retain_recent();
                allowed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct SteppingClock(Mutex<DateTime<Utc>>);

    impl SteppingClock {
        fn advance(&self, by: Duration) {
            let mut now = self.0.lock().expect("clock mutex poisoned");
            *now += by;
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().expect("clock mutex poisoned")
        }
    }

    fn stepping_clock() -> Arc<SteppingClock> {
        Arc::new(SteppingClock(Mutex::new(
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        )))
    }

    #[test]
    fn refuses_after_limit_until_window_passes() {
        let clock = stepping_clock();
        let limiter = QuotaRateLimiter::with_clock(2, Duration::minutes(10), clock.clone());

        assert!(limiter.check_and_record("student:1"));
        assert!(limiter.check_and_record("student:1"));
        assert!(!limiter.check_and_record("student:1"));
        assert!(limiter.check_and_record("student:2"));

        clock.advance(Duration::minutes(10));
        assert!(limiter.check_and_record("student:1"));
        assert!(limiter.check_and_record("student:1"));
        assert!(!limiter.check_and_record("student:1"));
    }

    #[test]
    fn attempts_replenish_one_at_a_time() {
        let clock = stepping_clock();
        let limiter = QuotaRateLimiter::with_clock(2, Duration::minutes(10), clock.clone());

        assert!(limiter.check_and_record("student:1"));
        assert!(limiter.check_and_record("student:1"));

        clock.advance(Duration::minutes(5));
        assert!(limiter.check_and_record("student:1"));
        assert!(!limiter.check_and_record("student:1"));
    }

    #[test]
    fn zero_limit_refuses_everything() {
        let limiter = QuotaRateLimiter::new(0, Duration::seconds(30));
        assert!(!limiter.check_and_record("anyone"));
        assert!(Unlimited.check_and_record("anyone"));
    }

    #[test]
    fn empty_window_never_refuses() {
        let limiter = QuotaRateLimiter::with_clock(1, Duration::zero(), stepping_clock());
        for _ in 0..5 {
            assert!(limiter.check_and_record("student:1"));
        }
    }
}

//! Time sources.
//!
//! Stores and the token verifier never read the system clock directly; they
//! take an `Arc<dyn Clock>` so tests can drive expiry and refill without
//! sleeping.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Abstraction over wall-clock and monotonic time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current Unix timestamp in seconds (credential expiry).
    fn now_secs(&self) -> u64;

    /// Monotonic instant for elapsed/TTL comparisons.
    fn monotonic_now(&self) -> Instant;
}

/// Production clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }

    fn monotonic_now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
///
/// Both readings advance together, so a test that calls [`ManualClock::advance`]
/// sees tokens expire and buckets refill consistently.
#[derive(Debug)]
pub struct ManualClock {
    origin_secs: u64,
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Start at the given Unix timestamp.
    pub fn new(unix_secs: u64) -> Self {
        Self {
            origin_secs: unix_secs,
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Start at the current system time.
    pub fn starting_now() -> Self {
        Self::new(SystemClock.now_secs())
    }

    /// Move both readings forward.
    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }

    fn offset(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.origin_secs + self.offset().as_secs()
    }

    fn monotonic_now(&self) -> Instant {
        self.origin + self.offset()
    }
}

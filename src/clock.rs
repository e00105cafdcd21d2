//! Time sources.
//!
//! Usage windows and cache timestamps are computed from a [`Clock`] rather
//! than from the system time directly, so window rollover can be driven
//! deterministically in tests with [`ManualClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of wall-clock time, in whole seconds since the unix epoch.
pub trait Clock: Send + Sync {
    fn unix_time(&self) -> u64;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_time(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
///
/// ```rust
/// # use relaygate::clock::{Clock, ManualClock};
/// # use std::time::Duration;
/// let clock = ManualClock::new(120);
/// clock.advance(Duration::from_secs(60));
/// assert_eq!(clock.unix_time(), 180);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `unix_time` seconds.
    pub fn new(unix_time: u64) -> Self {
        Self {
            now: AtomicU64::new(unix_time),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_secs(), Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, unix_time: u64) {
        self.now.store(unix_time, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn unix_time(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.unix_time() > 1_577_836_800);
    }

    #[test]
    fn manual_clock_set_and_advance() {
        let clock = ManualClock::new(0);
        clock.set(3_600);
        clock.advance(Duration::from_secs(59));
        assert_eq!(clock.unix_time(), 3_659);
    }
}

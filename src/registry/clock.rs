//! Wall-clock time source for slot ages
//!
//! Timestamps are durations since the UNIX epoch. Reading the clock can
//! fail (a system clock set before the epoch); callers decide whether that
//! rejects the operation or just skips it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Error reading the time source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockError(pub String);

impl std::fmt::Display for ClockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Clock read failed: {}", self.0)
    }
}

impl std::error::Error for ClockError {}

/// Source of the current wall-clock time
pub trait Clock: Send + Sync {
    /// Current time as a duration since the UNIX epoch
    fn now(&self) -> Result<Duration, ClockError>;
}

/// The system wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<Duration, ClockError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ClockError(e.to_string()))
    }
}

/// Manually driven clock
///
/// Clones share the same underlying time, so a test can keep one handle
/// and give another to the registry.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start`
    pub fn new(start: Duration) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(start.as_nanos() as u64)),
        }
    }

    /// Set the current time
    pub fn set(&self, now: Duration) {
        self.nanos.store(now.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Move the clock forward by `delta`
    pub fn advance(&self, delta: Duration) {
        self.nanos
            .fetch_add(delta.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Result<Duration, ClockError> {
        Ok(Duration::from_nanos(self.nanos.load(Ordering::SeqCst)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_after_epoch() {
        let now = SystemClock.now().unwrap();
        assert!(now > Duration::from_secs(1_600_000_000));
    }

    #[test]
    fn test_manual_clock_shared() {
        let clock = ManualClock::new(Duration::from_secs(10));
        let handle = clock.clone();

        handle.advance(Duration::from_millis(1500));
        assert_eq!(clock.now().unwrap(), Duration::from_millis(11_500));

        handle.set(Duration::from_secs(3));
        assert_eq!(clock.now().unwrap(), Duration::from_secs(3));
    }
}

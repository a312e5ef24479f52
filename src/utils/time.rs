//! Wall-clock access for freshness checks.
//!
//! The authenticator reads the time through [`Clock`] so tests can pin it.

use crate::error::{constants, GatewayError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of the current UTC time as seconds since the UNIX epoch.
pub trait Clock: Send + Sync {
    fn unix_time(&self) -> Result<Duration>;
}

/// The operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_time(&self) -> Result<Duration> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| GatewayError::Custom(constants::ERR_SYSTEM_TIME.into()))
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    secs: AtomicU64,
}

impl ManualClock {
    pub fn new(unix_secs: u64) -> Self {
        Self {
            secs: AtomicU64::new(unix_secs),
        }
    }

    pub fn set(&self, unix_secs: u64) {
        self.secs.store(unix_secs, Ordering::Relaxed);
    }

    pub fn advance(&self, by: Duration) {
        self.secs.fetch_add(by.as_secs(), Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn unix_time(&self) -> Result<Duration> {
        Ok(Duration::from_secs(self.secs.load(Ordering::Relaxed)))
    }
}

/// UTC `(hour, minute, second)` of a UNIX timestamp.
pub fn utc_time_of_day(unix_secs: u64) -> (u64, u64, u64) {
    let secs_of_day = unix_secs % 86_400;
    (secs_of_day / 3600, (secs_of_day % 3600) / 60, secs_of_day % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_of_day() {
        // 2024-01-01T13:45:30Z
        assert_eq!(utc_time_of_day(1_704_116_730), (13, 45, 30));
        assert_eq!(utc_time_of_day(0), (0, 0, 0));
        assert_eq!(utc_time_of_day(86_399), (23, 59, 59));
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.unix_time().unwrap().as_secs(), 100);
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.unix_time().unwrap().as_secs(), 105);
        clock.set(7);
        assert_eq!(clock.unix_time().unwrap().as_secs(), 7);
    }

    #[test]
    fn test_system_clock_after_epoch() {
        assert!(SystemClock.unix_time().unwrap().as_secs() > 1_600_000_000);
    }
}

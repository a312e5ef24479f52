//! Coarse timestamp freshness.
//!
//! Fobs stamp each frame with the current UTC time folded into a 6-hour
//! rotation: `sec + 60 * min + 3600 * (hour / 4)`. The gateway folds its own
//! clock the same way and accepts a frame whose stamp lies strictly less than
//! `tolerance` units from that value, measured around the cycle so the window
//! wraps at the period boundary.
//!
//! The `hour / 4` bucketing maps hours 0-3 onto one slot, 4-7 onto the next,
//! and so on. It is the transmitter firmware's contract and lives only in
//! [`reduce`].

use crate::error::Result;
use crate::utils::time::{utc_time_of_day, Clock};

/// Length of the rotating time domain.
pub const DEFAULT_PERIOD: u16 = 21_600;

/// Size of the range a UTC day folds into. A configured period must divide
/// it, or the window and the folded clock would wrap at different points.
pub const ROTATION: u16 = 21_600;

/// Exclusive bound on the distance from the gateway's reduced time.
pub const DEFAULT_TOLERANCE: u16 = 20;

/// Fold a UNIX timestamp into the rotating domain used on the wire.
pub fn reduce(unix_secs: u64, period: u16) -> u16 {
    let (hour, min, sec) = utc_time_of_day(unix_secs);
    let folded = sec + 60 * min + 3600 * (hour / 4);
    (folded % u64::from(period.max(1))) as u16
}

/// Cyclic distance between two points of a domain of size `period`.
#[inline]
pub fn cyclic_distance(a: u16, b: u16, period: u16) -> u16 {
    let period = u32::from(period);
    let forward = (u32::from(a) + period - u32::from(b)) % period;
    forward.min(period - forward) as u16
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessWindow {
    period: u16,
    tolerance: u16,
}

impl FreshnessWindow {
    pub fn new(period: u16, tolerance: u16) -> Self {
        Self { period, tolerance }
    }

    pub fn period(&self) -> u16 {
        self.period
    }

    pub fn tolerance(&self) -> u16 {
        self.tolerance
    }

    /// Reduced value of `clock`'s current time.
    pub fn now_reduced(&self, clock: &dyn Clock) -> Result<u16> {
        Ok(reduce(clock.unix_time()?.as_secs(), self.period))
    }

    /// Whether a frame stamped `time` is fresh relative to `now_reduced`.
    ///
    /// Stamps outside `[0, period)` can never be produced by a fob and are
    /// rejected.
    pub fn is_fresh(&self, time: u16, now_reduced: u16) -> bool {
        if time >= self.period || now_reduced >= self.period {
            return false;
        }
        cyclic_distance(time, now_reduced, self.period) < self.tolerance
    }
}

impl Default for FreshnessWindow {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD, DEFAULT_TOLERANCE)
    }
}

//! Rolling-code replay window.
//!
//! A device's next sequence must lie strictly after the last accepted one and
//! at most `window` steps ahead, measured modulo 2^16. Replays and codes from
//! the past fall outside the set, as do jumps too large to be a fob that
//! simply pressed its button while out of range.

/// Forward window accepted past the last sequence.
pub const DEFAULT_REPLAY_WINDOW: u16 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayWindow {
    window: u16,
}

impl ReplayWindow {
    pub fn new(window: u16) -> Self {
        Self { window }
    }

    pub fn window(&self) -> u16 {
        self.window
    }

    /// Whether `sequence` is one of the `window` values cyclically
    /// following `last_accepted`.
    #[inline]
    pub fn accepts(&self, last_accepted: u16, sequence: u16) -> bool {
        let ahead = sequence.wrapping_sub(last_accepted);
        ahead != 0 && ahead <= self.window
    }

    /// Check `sequence` against `last_accepted` and advance it on success.
    ///
    /// Callers must hold the device's lock across this call so the check and
    /// the update cannot interleave with another frame for the same device.
    pub fn check_and_advance(&self, last_accepted: &mut u16, sequence: u16) -> bool {
        if !self.accepts(*last_accepted, sequence) {
            return false;
        }
        *last_accepted = sequence;
        true
    }
}

impl Default for ReplayWindow {
    fn default() -> Self {
        Self::new(DEFAULT_REPLAY_WINDOW)
    }
}

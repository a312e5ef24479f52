//! Frame authentication against the device registry.
//!
//! Frames carry no sender identifier, so the authenticator decodes once and
//! then tries every device in registry order. A device matches only if its
//! secret verifies the signature, the stamp is fresh, and the sequence falls
//! in its replay window. The replay state of the first matching device is
//! advanced; nothing else is ever mutated.

use crate::auth::freshness::FreshnessWindow;
use crate::auth::registry::{DeviceId, DeviceRegistry};
use crate::auth::replay::ReplayWindow;
use crate::auth::signature;
use crate::core::package::{Action, Package};
use crate::error::{GatewayError, Result};
use crate::utils::time::{Clock, SystemClock};
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Outcome of a successful authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedCommand {
    pub device: DeviceId,
    pub action: Action,
    pub sequence: u16,
}

pub struct Authenticator {
    registry: Arc<DeviceRegistry>,
    freshness: FreshnessWindow,
    replay: ReplayWindow,
    clock: Arc<dyn Clock>,
}

impl Authenticator {
    /// Authenticator with default windows and the system clock.
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self {
            registry,
            freshness: FreshnessWindow::default(),
            replay: ReplayWindow::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_windows(mut self, freshness: FreshnessWindow, replay: ReplayWindow) -> Self {
        self.freshness = freshness;
        self.replay = replay;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn freshness(&self) -> &FreshnessWindow {
        &self.freshness
    }

    /// Authenticate a raw frame at the clock's current time.
    ///
    /// # Errors
    /// - `MalformedFrame` / `UnknownAction` if the frame does not decode
    /// - `AuthenticationFailed` if no device validates it
    /// - clock errors if the system time is unusable
    pub fn authenticate(&self, raw: &[u8]) -> Result<AuthenticatedCommand> {
        let package = Package::from_bytes(raw)?;
        let now_reduced = self.freshness.now_reduced(self.clock.as_ref())?;
        self.authenticate_package(&package, now_reduced)
    }

    /// Authenticate a raw frame against a caller-supplied reduced time.
    pub fn authenticate_at(&self, raw: &[u8], now_reduced: u16) -> Result<AuthenticatedCommand> {
        let package = Package::from_bytes(raw)?;
        self.authenticate_package(&package, now_reduced)
    }

    #[instrument(skip(self, package), fields(sequence = package.sequence, time = package.time))]
    fn authenticate_package(
        &self,
        package: &Package,
        now_reduced: u16,
    ) -> Result<AuthenticatedCommand> {
        for device in self.registry.iter() {
            if !signature::verify(device.secret(), package) {
                continue;
            }
            if !self.freshness.is_fresh(package.time, now_reduced) {
                trace!(device = device.name(), now_reduced, "Signature ok, stamp stale");
                continue;
            }
            if !device.advance_sequence(&self.replay, package.sequence) {
                trace!(
                    device = device.name(),
                    last = device.last_accepted_sequence(),
                    "Signature ok, sequence outside replay window"
                );
                continue;
            }

            debug!(device = device.name(), action = %package.action, "Frame authenticated");
            return Ok(AuthenticatedCommand {
                device: device.id(),
                action: package.action,
                sequence: package.sequence,
            });
        }

        Err(GatewayError::AuthenticationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::secret::DeviceSecret;
    use crate::core::package::FRAME_SIZE;
    use crate::utils::time::ManualClock;

    fn frame(secret: &DeviceSecret, time: u16, sequence: u16, action: Action) -> [u8; FRAME_SIZE] {
        let header = Package::new(FRAME_SIZE as u16, time, sequence, action, [0; 32]);
        let sig = signature::sign(secret, header.header_bytes());
        Package::new(FRAME_SIZE as u16, time, sequence, action, sig).to_bytes()
    }

    fn registry(secrets: &[[u8; 32]], sequence: u16) -> Arc<DeviceRegistry> {
        let mut registry = DeviceRegistry::new();
        for s in secrets {
            registry.register("", DeviceSecret::new(*s), sequence);
        }
        Arc::new(registry)
    }

    #[test]
    fn test_matches_second_device() {
        let auth = Authenticator::new(registry(&[[1; 32], [2; 32]], 0));
        let raw = frame(&DeviceSecret::new([2; 32]), 1000, 1, Action::Close);

        let cmd = auth.authenticate_at(&raw, 1000).unwrap();
        assert_eq!(cmd.device, DeviceId(1));
        assert_eq!(cmd.action, Action::Close);

        let reg = auth.registry();
        assert_eq!(reg.get(DeviceId(0)).unwrap().last_accepted_sequence(), 0);
        assert_eq!(reg.get(DeviceId(1)).unwrap().last_accepted_sequence(), 1);
    }

    #[test]
    fn test_first_in_order_wins_on_tie() {
        let auth = Authenticator::new(registry(&[[7; 32], [7; 32]], 0));
        let raw = frame(&DeviceSecret::new([7; 32]), 50, 3, Action::Open);

        assert_eq!(auth.authenticate_at(&raw, 50).unwrap().device, DeviceId(0));
        assert_eq!(
            auth.registry().get(DeviceId(1)).unwrap().last_accepted_sequence(),
            0
        );
    }

    #[test]
    fn test_stale_frame_does_not_mutate() {
        let auth = Authenticator::new(registry(&[[1; 32]], 0));
        let raw = frame(&DeviceSecret::new([1; 32]), 1000, 1, Action::Open);

        assert!(matches!(
            auth.authenticate_at(&raw, 2000),
            Err(GatewayError::AuthenticationFailed)
        ));
        assert_eq!(
            auth.registry().get(DeviceId(0)).unwrap().last_accepted_sequence(),
            0
        );
    }

    #[test]
    fn test_decode_errors_short_circuit() {
        let auth = Authenticator::new(registry(&[[1; 32]], 0));
        assert!(matches!(
            auth.authenticate_at(&[0u8; 10], 0),
            Err(GatewayError::MalformedFrame { .. })
        ));

        let mut raw = frame(&DeviceSecret::new([1; 32]), 0, 1, Action::Open);
        raw[6] = 3;
        assert!(matches!(
            auth.authenticate_at(&raw, 0),
            Err(GatewayError::UnknownAction(3))
        ));
    }

    #[test]
    fn test_uses_injected_clock() {
        // 08:00:10 UTC folds to 2 * 3600 + 10
        let clock = Arc::new(ManualClock::new(8 * 3600 + 10));
        let auth = Authenticator::new(registry(&[[4; 32]], 0)).with_clock(clock.clone());

        let raw = frame(&DeviceSecret::new([4; 32]), 7210, 1, Action::Open);
        assert!(auth.authenticate(&raw).is_ok());

        clock.advance(std::time::Duration::from_secs(60));
        let raw = frame(&DeviceSecret::new([4; 32]), 7210, 2, Action::Open);
        assert!(matches!(
            auth.authenticate(&raw),
            Err(GatewayError::AuthenticationFailed)
        ));
    }

    #[test]
    fn test_empty_registry_rejects() {
        let auth = Authenticator::new(Arc::new(DeviceRegistry::new()));
        let raw = frame(&DeviceSecret::new([1; 32]), 0, 1, Action::Open);
        assert!(matches!(
            auth.authenticate_at(&raw, 0),
            Err(GatewayError::AuthenticationFailed)
        ));
    }
}

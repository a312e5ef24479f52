//! Provisioned devices and their replay state.
//!
//! The registry is built once at startup and shared behind an `Arc`. Only the
//! per-device sequence is mutable after that, and each device guards its own
//! sequence with a dedicated lock so frames for different devices never
//! contend.

use crate::auth::replay::ReplayWindow;
use crate::auth::secret::DeviceSecret;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

/// Position of a device in its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub usize);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One provisioned fob.
///
/// The replay state only moves through the authenticator:
///
/// ```compile_fail
/// use keyfob_gateway::auth::replay::ReplayWindow;
/// use keyfob_gateway::auth::{DeviceRegistry, DeviceSecret};
///
/// let mut registry = DeviceRegistry::new();
/// let id = registry.register("car", DeviceSecret::new([0; 32]), 0);
/// registry.get(id).unwrap().advance_sequence(&ReplayWindow::default(), 5);
/// ```
pub struct Device {
    id: DeviceId,
    name: String,
    secret: DeviceSecret,
    last_accepted_sequence: Mutex<u16>,
}

impl Device {
    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn secret(&self) -> &DeviceSecret {
        &self.secret
    }

    /// Current replay state.
    pub fn last_accepted_sequence(&self) -> u16 {
        *self.lock_sequence()
    }

    /// Atomically check `sequence` against the replay window and store it on
    /// success.
    pub(crate) fn advance_sequence(&self, window: &ReplayWindow, sequence: u16) -> bool {
        let mut last = self.lock_sequence();
        window.check_and_advance(&mut last, sequence)
    }

    // A panic while holding the lock cannot leave a u16 half-written, so a
    // poisoned lock still guards a valid sequence.
    fn lock_sequence(&self) -> MutexGuard<'_, u16> {
        self.last_accepted_sequence.lock().unwrap_or_else(|poisoned| {
            warn!(device = %self.name, "Recovering poisoned sequence lock");
            poisoned.into_inner()
        })
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("last_accepted_sequence", &self.last_accepted_sequence())
            .finish_non_exhaustive()
    }
}

/// Ordered set of devices. Iteration order is registration order and is the
/// tie-break when more than one device could validate a frame.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device. An empty name becomes `device-<index>`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        secret: DeviceSecret,
        initial_sequence: u16,
    ) -> DeviceId {
        let id = DeviceId(self.devices.len());
        let mut name = name.into();
        if name.is_empty() {
            name = format!("device-{}", id.0);
        }

        self.devices.push(Device {
            id,
            name,
            secret,
            last_accepted_sequence: Mutex::new(initial_sequence),
        });
        id
    }

    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_register_assigns_ids_in_order() {
        let mut registry = DeviceRegistry::new();
        let a = registry.register("front-door", DeviceSecret::new([1; 32]), 0);
        let b = registry.register("", DeviceSecret::new([2; 32]), 42);

        assert_eq!(a, DeviceId(0));
        assert_eq!(b, DeviceId(1));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(b).unwrap().name(), "device-1");
        assert_eq!(registry.get(b).unwrap().last_accepted_sequence(), 42);

        let names: Vec<_> = registry.iter().map(Device::name).collect();
        assert_eq!(names, ["front-door", "device-1"]);
    }

    #[test]
    fn test_debug_hides_secret() {
        let mut registry = DeviceRegistry::new();
        registry.register("car", DeviceSecret::new([0x5A; 32]), 3);
        let printed = format!("{registry:?}");
        assert!(printed.contains("car"));
        assert!(!printed.contains("5A") && !printed.contains("90"));
    }

    #[test]
    fn test_concurrent_advance_accepts_once() {
        let mut registry = DeviceRegistry::new();
        let id = registry.register("car", DeviceSecret::new([0; 32]), 10);
        let registry = Arc::new(registry);
        let window = ReplayWindow::default();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.get(id).unwrap().advance_sequence(&window, 11))
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(registry.get(id).unwrap().last_accepted_sequence(), 11);
    }
}

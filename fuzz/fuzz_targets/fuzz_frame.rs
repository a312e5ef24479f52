#![no_main]

use keyfob_gateway::auth::{Authenticator, DeviceRegistry, DeviceSecret};
use keyfob_gateway::core::package::Package;
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    // Decoding must never panic, whatever arrives on the socket
    let _ = Package::from_bytes(data);

    let mut registry = DeviceRegistry::new();
    registry.register("fuzz", DeviceSecret::new([0; 32]), 0);
    let auth = Authenticator::new(Arc::new(registry));

    let now = data.first().map(|b| u16::from(*b) * 100).unwrap_or(0);
    let before = auth.registry().iter().map(|d| d.last_accepted_sequence()).sum::<u16>();
    if auth.authenticate_at(data, now).is_err() {
        let after = auth.registry().iter().map(|d| d.last_accepted_sequence()).sum::<u16>();
        assert_eq!(before, after, "rejected frame moved device state");
    }
});

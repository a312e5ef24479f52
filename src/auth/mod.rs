//! # Authentication
//!
//! Decides whether a decoded frame is a genuine, fresh, non-replayed command
//! from a provisioned device.
//!
//! ## Components
//! - **Secret**: zeroized 32-byte device key
//! - **Signature**: SHA-256 over `secret || header`, constant-time compare
//! - **Freshness**: coarse timestamp window over a 6-hour rotation
//! - **Replay**: forward-only rolling-code window modulo 2^16
//! - **Registry**: ordered devices, one lock per replay counter
//! - **Authenticator**: decode once, scan registry, first full match wins

pub mod authenticator;
pub mod freshness;
pub mod registry;
pub mod replay;
pub mod secret;
pub mod signature;

pub use authenticator::{AuthenticatedCommand, Authenticator};
pub use registry::{Device, DeviceId, DeviceRegistry};
pub use secret::DeviceSecret;

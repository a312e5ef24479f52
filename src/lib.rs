//! # keyfob-gateway
//!
//! Authentication gateway for rolling-code key fob commands.
//!
//! A fob sends a single 39-byte frame per button press: a 7-byte header
//! (declared length, coarse timestamp, rolling sequence, action) followed by
//! `SHA-256(secret || header)`. The frame names no sender. The gateway tries
//! every provisioned device in order and accepts the frame for the first one
//! whose secret verifies the signature, whose stamp is fresh, and whose
//! replay window admits the sequence. Only then is that device's sequence
//! advanced and the action actuated.
//!
//! ## Layout
//! - [`core`](crate::core): wire layout and tokio codec
//! - [`auth`]: signature, freshness, replay window, registry, authenticator
//! - [`protocol`]: dispatch of accepted commands to actuators
//! - [`transport`]: TCP listener and fob-side transmitter
//! - [`config`]: TOML configuration and validation
//! - [`utils`]: logging, metrics, clock, timeouts
//!
//! ## Example
//! ```rust
//! use keyfob_gateway::auth::{Authenticator, DeviceRegistry, DeviceSecret};
//! use keyfob_gateway::core::package::Action;
//! use keyfob_gateway::transport::Transmitter;
//! use std::sync::Arc;
//!
//! let mut registry = DeviceRegistry::new();
//! let device = registry.register("garage", DeviceSecret::new([7; 32]), 0);
//! let authenticator = Authenticator::new(Arc::new(registry));
//!
//! let mut fob = Transmitter::new(DeviceSecret::new([7; 32]), 0);
//! let frame = fob.next_package(Action::Open, 1200);
//!
//! let command = authenticator.authenticate_at(frame.as_bytes(), 1200).unwrap();
//! assert_eq!(command.device, device);
//! assert_eq!(command.action, Action::Open);
//! ```

pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod utils;

pub use auth::{AuthenticatedCommand, Authenticator};
pub use crate::core::package::{Action, Package};
pub use error::{GatewayError, Result};

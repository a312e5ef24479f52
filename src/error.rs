//! # Error Types
//!
//! Error handling for the key fob gateway.
//!
//! This module defines every error variant the gateway can report, from
//! frame-level decode failures on attacker-controlled input up to listener
//! I/O and configuration problems.
//!
//! ## Error Categories
//! - **Frame Errors**: wrong frame length, unknown action byte, oversized input
//! - **Authentication**: no registered device validates the frame
//! - **Dispatch Errors**: accepted action with no actuation handler
//! - **I/O Errors**: listener, transmitter and file system failures
//! - **Configuration Errors**: invalid TOML, bad secrets, failed validation
//!
//! Decode and validation failures are always returned as values; the
//! authentication path never panics on input it receives over the wire.
//!
//! ## Example Usage
//! ```rust
//! use keyfob_gateway::core::package::Package;
//! use keyfob_gateway::error::GatewayError;
//! use tracing::warn;
//!
//! match Package::from_bytes(&[0u8; 12]) {
//!     Err(GatewayError::MalformedFrame { actual, .. }) => warn!(actual, "Dropping short frame"),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use crate::core::package::Action;
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Dispatcher errors
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on dispatcher";

    /// Clock errors
    pub const ERR_SYSTEM_TIME: &str = "System time error: clock is before the UNIX epoch";

    /// Secret errors
    pub const ERR_SECRET_HEX: &str = "Device secret is not valid hex";
    pub const ERR_SECRET_LENGTH: &str = "Device secret must be exactly 32 bytes";
    pub const ERR_SECRET_RNG: &str = "Failed to generate random device secret";
}

/// Primary error type for all gateway operations.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed frame: expected {expected} bytes, got {actual}")]
    MalformedFrame { expected: usize, actual: usize },

    #[error("Unknown action discriminator: {0}")]
    UnknownAction(i8),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Frame too large: {0} bytes")]
    OversizedFrame(usize),

    #[error("No handler registered for action {0:?}")]
    UnhandledAction(Action),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout occurred")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid device secret: {0}")]
    InvalidSecret(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl GatewayError {
    /// Whether this error came from judging a received frame rather than
    /// from local infrastructure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GatewayError::MalformedFrame { .. }
                | GatewayError::UnknownAction(_)
                | GatewayError::AuthenticationFailed
                | GatewayError::OversizedFrame(_)
        )
    }
}

/// Type alias for Results using GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;

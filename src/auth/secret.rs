//! Per-device shared secret.

use crate::error::{constants, GatewayError, Result};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of a device secret in bytes.
pub const SECRET_SIZE: usize = 32;

/// Key material shared between one fob and the gateway.
///
/// Wiped on drop. `Debug` never prints the bytes.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DeviceSecret([u8; SECRET_SIZE]);

impl DeviceSecret {
    pub fn new(bytes: [u8; SECRET_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parse a 64-character hex string (case-insensitive).
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = hex::decode(s.trim())
            .map_err(|e| GatewayError::InvalidSecret(format!("{}: {e}", constants::ERR_SECRET_HEX)))?;

        if bytes.len() != SECRET_SIZE {
            let len = bytes.len();
            bytes.zeroize();
            return Err(GatewayError::InvalidSecret(format!(
                "{} (got {len})",
                constants::ERR_SECRET_LENGTH
            )));
        }

        let mut secret = [0u8; SECRET_SIZE];
        secret.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self(secret))
    }

    /// Draw a fresh secret from the operating system RNG.
    pub fn generate() -> Result<Self> {
        let mut secret = [0u8; SECRET_SIZE];
        getrandom::fill(&mut secret)
            .map_err(|e| GatewayError::InvalidSecret(format!("{}: {e}", constants::ERR_SECRET_RNG)))?;
        Ok(Self(secret))
    }

    /// Upper-case hex encoding, for provisioning output only.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; SECRET_SIZE] {
        &self.0
    }
}

impl PartialEq for DeviceSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for DeviceSecret {}

impl fmt::Debug for DeviceSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeviceSecret(<redacted>)")
    }
}

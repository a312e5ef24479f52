//! # Package Frame
//!
//! Decoding and encoding of the fixed 39-byte command frame sent by a fob.
//!
//! ## Wire Format
//! ```text
//! [Length(2)] [Time(2)] [Sequence(2)] [Action(1)] [Signature(32)]
//! ```
//! All multi-byte integers are little-endian. The signature covers the first
//! seven bytes (the header) and nothing else.

use crate::error::{GatewayError, Result};
use std::fmt;

/// Size of the signed header: length, time, sequence and action.
pub const HEADER_SIZE: usize = 2 + 2 + 2 + 1;

/// Size of the SHA-256 signature trailer.
pub const SIGNATURE_SIZE: usize = 32;

/// Total size of one frame on the wire.
pub const FRAME_SIZE: usize = HEADER_SIZE + SIGNATURE_SIZE;

/// Command requested by a fob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Open,
    Close,
}

impl Action {
    /// Wire discriminator for this action.
    pub fn to_byte(self) -> i8 {
        match self {
            Action::Open => 1,
            Action::Close => -1,
        }
    }

    /// Parse a wire discriminator.
    pub fn from_byte(byte: i8) -> Result<Self> {
        match byte {
            1 => Ok(Action::Open),
            -1 => Ok(Action::Close),
            other => Err(GatewayError::UnknownAction(other)),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Open => f.write_str("open"),
            Action::Close => f.write_str("close"),
        }
    }
}

/// One decoded frame. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Frame length as declared by the sender
    pub length: u16,
    /// Coarse sender timestamp, reduced to the freshness period
    pub time: u16,
    /// Rolling sequence counter
    pub sequence: u16,
    /// Requested action
    pub action: Action,
    /// SHA-256 over `secret || header`
    pub signature: [u8; SIGNATURE_SIZE],
    raw: [u8; FRAME_SIZE],
}

impl Package {
    /// Build a package from its fields. The signature is taken as given.
    pub fn new(
        length: u16,
        time: u16,
        sequence: u16,
        action: Action,
        signature: [u8; SIGNATURE_SIZE],
    ) -> Self {
        let mut raw = [0u8; FRAME_SIZE];
        raw[0..2].copy_from_slice(&length.to_le_bytes());
        raw[2..4].copy_from_slice(&time.to_le_bytes());
        raw[4..6].copy_from_slice(&sequence.to_le_bytes());
        raw[6] = action.to_byte() as u8;
        raw[HEADER_SIZE..].copy_from_slice(&signature);

        Self {
            length,
            time,
            sequence,
            action,
            signature,
            raw,
        }
    }

    /// Decode a frame.
    ///
    /// # Errors
    /// - `MalformedFrame` unless `bytes` is exactly [`FRAME_SIZE`] long
    /// - `UnknownAction` if the action byte is not a known discriminator
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw: [u8; FRAME_SIZE] =
            bytes
                .try_into()
                .map_err(|_| GatewayError::MalformedFrame {
                    expected: FRAME_SIZE,
                    actual: bytes.len(),
                })?;

        let length = u16::from_le_bytes([raw[0], raw[1]]);
        let time = u16::from_le_bytes([raw[2], raw[3]]);
        let sequence = u16::from_le_bytes([raw[4], raw[5]]);
        let action = Action::from_byte(raw[6] as i8)?;

        let mut signature = [0u8; SIGNATURE_SIZE];
        signature.copy_from_slice(&raw[HEADER_SIZE..]);

        Ok(Self {
            length,
            time,
            sequence,
            action,
            signature,
            raw,
        })
    }

    /// The signed span of the frame.
    #[inline]
    pub fn header_bytes(&self) -> &[u8] {
        &self.raw[..HEADER_SIZE]
    }

    /// The full frame as received or built.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; FRAME_SIZE] {
        &self.raw
    }

    /// Copy of the wire encoding.
    pub fn to_bytes(&self) -> [u8; FRAME_SIZE] {
        self.raw
    }
}

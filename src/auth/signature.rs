//! Keyed header signature.
//!
//! `signature = SHA-256(secret || header)`. Verification compares every byte
//! in constant time.

use crate::auth::secret::DeviceSecret;
use crate::core::package::{Package, SIGNATURE_SIZE};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compute the signature a fob holding `secret` would attach to `header`.
pub fn sign(secret: &DeviceSecret, header: &[u8]) -> [u8; SIGNATURE_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(header);
    hasher.finalize().into()
}

/// Whether `package` was signed with `secret`.
pub fn verify(secret: &DeviceSecret, package: &Package) -> bool {
    let expected = sign(secret, package.header_bytes());
    expected[..].ct_eq(&package.signature[..]).into()
}

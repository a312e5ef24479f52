//! Tokio codec for the one-frame-per-connection transport.
//!
//! A fob opens a connection, writes a single frame and closes. The decoder
//! therefore never yields mid-stream: it buffers until EOF and hands the whole
//! payload over as raw bytes, leaving it to the authenticator to judge the
//! layout. Input beyond `max_frame_bytes` is rejected early so a peer cannot
//! make the gateway buffer without bound.

use crate::core::package::{Package, FRAME_SIZE};
use crate::error::{GatewayError, Result};
use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Default receive cap per connection.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024;

#[derive(Debug, Clone, Copy)]
pub struct PackageCodec {
    max_frame_bytes: usize,
}

impl PackageCodec {
    pub fn new() -> Self {
        Self::with_max_frame_bytes(DEFAULT_MAX_FRAME_BYTES)
    }

    pub fn with_max_frame_bytes(max_frame_bytes: usize) -> Self {
        Self { max_frame_bytes }
    }
}

impl Default for PackageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for PackageCodec {
    type Item = Bytes;
    type Error = GatewayError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() > self.max_frame_bytes {
            return Err(GatewayError::OversizedFrame(src.len()));
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.decode(src)?;
        if src.is_empty() {
            return Ok(None);
        }
        Ok(Some(src.split().freeze()))
    }
}

impl Encoder<Package> for PackageCodec {
    type Error = GatewayError;

    fn encode(&mut self, item: Package, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(FRAME_SIZE);
        dst.extend_from_slice(item.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::package::Action;

    #[test]
    fn test_decode_waits_for_eof() {
        let mut codec = PackageCodec::new();
        let mut buf = BytesMut::from(&[1u8; FRAME_SIZE][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), FRAME_SIZE);

        let frame = codec.decode_eof(&mut buf).unwrap().unwrap();
        assert_eq!(frame.len(), FRAME_SIZE);
        assert!(buf.is_empty());
        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_malformed_length_is_passed_through() {
        let mut codec = PackageCodec::new();
        let mut buf = BytesMut::from(&[7u8; 5][..]);
        let frame = codec.decode_eof(&mut buf).unwrap().unwrap();
        assert_eq!(&frame[..], &[7u8; 5]);
    }

    #[test]
    fn test_oversized_input_rejected() {
        let mut codec = PackageCodec::with_max_frame_bytes(64);
        let mut buf = BytesMut::from(&[0u8; 65][..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(GatewayError::OversizedFrame(65))
        ));
    }

    #[test]
    fn test_encode_writes_wire_layout() {
        let pkg = Package::new(39, 10, 11, Action::Open, [3u8; 32]);
        let mut codec = PackageCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(pkg.clone(), &mut buf).unwrap();
        assert_eq!(&buf[..], pkg.as_bytes());
    }
}

//! # Core Frame Components
//!
//! Low-level frame handling: the fixed wire layout and the tokio codec used by
//! the listener and the transmitter.
//!
//! ## Components
//! - **Package**: 39-byte command frame with a signed 7-byte header
//! - **Codec**: Tokio codec for one frame per connection
//!
//! ## Wire Format
//! ```text
//! [Length(2)] [Time(2)] [Sequence(2)] [Action(1)] [Signature(32)]
//! ```
//!
//! ## Security
//! - Exact-length check before any field is read
//! - Per-connection receive cap (1 KB default)

pub mod codec;
pub mod package;

//! # Transport
//!
//! TCP plumbing on both ends of the link.
//!
//! ## Components
//! - **Listener**: gateway accept loop, bind retry, one frame per connection
//! - **Transmitter**: fob-side frame construction and send

pub mod listener;
pub mod transmitter;

pub use listener::{bind_with_retry, GatewayServer};
pub use transmitter::Transmitter;

//! # Utility Modules
//!
//! Supporting utilities for logging, metrics and timing.
//!
//! ## Components
//! - **Logging**: `tracing-subscriber` setup from configuration
//! - **Metrics**: Thread-safe counters for frames and authentication outcomes
//! - **Time**: Injectable wall clock and UTC time-of-day helpers
//! - **Timeout**: Receive/send deadlines and bind retry backoff

pub mod logging;
pub mod metrics;
pub mod time;
pub mod timeout;

pub use metrics::{Metrics, MetricsSnapshot};
pub use time::{Clock, ManualClock, SystemClock};

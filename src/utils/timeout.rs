//! Timeout constants and async wrappers used by the listener and transmitter.

use crate::error::{GatewayError, Result};
use std::future::Future;
use std::time::Duration;

/// How long a connection may take to deliver its frame and close.
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed delay between attempts to bind the listen socket.
pub const BIND_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Grace period for open connections on shutdown.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Connect-and-send budget for the transmitter.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(3);

/// Await `fut`, mapping an elapsed deadline to `GatewayError::Timeout`.
pub async fn with_timeout_error<F, T>(fut: F, duration: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(duration, fut)
        .await
        .map_err(|_| GatewayError::Timeout)?
}

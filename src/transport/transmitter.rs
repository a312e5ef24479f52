//! Fob-side frame construction and delivery.
//!
//! Mirrors what the transmitter firmware does on a button press: bump the
//! rolling counter, stamp the reduced UTC time, sign the header with the
//! device secret, then open a connection, write the frame and close.

use crate::auth::freshness::{reduce, DEFAULT_PERIOD};
use crate::auth::signature;
use crate::auth::DeviceSecret;
use crate::core::codec::PackageCodec;
use crate::core::package::{Action, Package, FRAME_SIZE, SIGNATURE_SIZE};
use crate::error::{GatewayError, Result};
use crate::utils::time::{Clock, SystemClock};
use crate::utils::timeout::{with_timeout_error, SEND_TIMEOUT};
use futures::SinkExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_util::codec::FramedWrite;
use tracing::{debug, instrument};

pub struct Transmitter {
    secret: DeviceSecret,
    sequence: u16,
    period: u16,
    clock: Arc<dyn Clock>,
    send_timeout: Duration,
}

impl Transmitter {
    /// `sequence` is the last value this fob sent; the next frame uses
    /// `sequence + 1`.
    pub fn new(secret: DeviceSecret, sequence: u16) -> Self {
        Self {
            secret,
            sequence,
            period: DEFAULT_PERIOD,
            clock: Arc::new(SystemClock),
            send_timeout: SEND_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_period(mut self, period: u16) -> Self {
        self.period = period;
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Last sequence used.
    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    /// Advance the counter and build a signed frame stamped `time`.
    pub fn next_package(&mut self, action: Action, time: u16) -> Package {
        self.sequence = self.sequence.wrapping_add(1);

        let unsigned = Package::new(
            FRAME_SIZE as u16,
            time,
            self.sequence,
            action,
            [0u8; SIGNATURE_SIZE],
        );
        let sig = signature::sign(&self.secret, unsigned.header_bytes());
        Package::new(FRAME_SIZE as u16, time, self.sequence, action, sig)
    }

    /// Build a frame stamped with the clock's current reduced time.
    pub fn next_package_now(&mut self, action: Action) -> Result<Package> {
        let now = self.clock.unix_time()?;
        Ok(self.next_package(action, reduce(now.as_secs(), self.period)))
    }

    /// Send one command to the gateway at `addr`. Returns the frame sent.
    #[instrument(skip(self), fields(sequence = self.sequence.wrapping_add(1)))]
    pub async fn send(&mut self, addr: &str, action: Action) -> Result<Package> {
        let package = self.next_package_now(action)?;
        let frame = package.clone();

        with_timeout_error(
            async move {
                let stream = TcpStream::connect(addr).await?;
                let mut writer = FramedWrite::new(stream, PackageCodec::new());
                writer.send(frame).await?;
                writer.close().await?;
                Ok::<_, GatewayError>(())
            },
            self.send_timeout,
        )
        .await?;

        debug!(addr, %action, "Frame sent");
        Ok(package)
    }
}

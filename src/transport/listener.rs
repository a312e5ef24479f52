//! TCP listener for fob frames.
//!
//! Each connection carries exactly one frame and then closes. The listener
//! reads it under a deadline, runs it through the authenticator and, on
//! acceptance, hands the command to the dispatcher. Nothing is ever written
//! back to the sender.

use crate::auth::{AuthenticatedCommand, Authenticator};
use crate::config::{GatewayConfig, ServerConfig};
use crate::core::codec::PackageCodec;
use crate::error::{GatewayError, Result};
use crate::protocol::dispatcher::Dispatcher;
use crate::utils::metrics::Metrics;
use crate::utils::timeout::with_timeout_error;
use futures::StreamExt;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, instrument, trace, warn};

/// Bind `addr`, retrying with a fixed `backoff` until it succeeds.
///
/// Transient conditions such as "address already in use" after a restart are
/// expected on the gateway hardware, so this never gives up.
#[instrument(skip(backoff))]
pub async fn bind_with_retry(addr: &str, backoff: Duration) -> TcpListener {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                info!(addr, attempt, "Listener bound");
                return listener;
            }
            Err(e) => {
                warn!(addr, attempt, error = %e, "Bind failed, retrying");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

struct ConnectionContext {
    authenticator: Arc<Authenticator>,
    dispatcher: Dispatcher,
    metrics: Arc<Metrics>,
    receive_timeout: Duration,
    max_frame_bytes: usize,
}

pub struct GatewayServer {
    context: Arc<ConnectionContext>,
    settings: ServerConfig,
}

impl GatewayServer {
    pub fn new(authenticator: Authenticator, dispatcher: Dispatcher) -> Self {
        Self::with_settings(authenticator, dispatcher, ServerConfig::default())
    }

    pub fn with_settings(
        authenticator: Authenticator,
        dispatcher: Dispatcher,
        settings: ServerConfig,
    ) -> Self {
        let context = ConnectionContext {
            authenticator: Arc::new(authenticator),
            dispatcher,
            metrics: Arc::new(Metrics::new()),
            receive_timeout: settings.receive_timeout,
            max_frame_bytes: settings.max_frame_bytes,
        };
        Self {
            context: Arc::new(context),
            settings,
        }
    }

    /// Build registry and authenticator from a validated configuration.
    pub fn from_config(config: &GatewayConfig, dispatcher: Dispatcher) -> Result<Self> {
        config.validate_strict()?;
        let registry = Arc::new(config.build_registry()?);
        let authenticator = Authenticator::new(registry)
            .with_windows(config.auth.freshness_window(), config.auth.replay_window());
        Ok(Self::with_settings(
            authenticator,
            dispatcher,
            config.server.clone(),
        ))
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.context.metrics)
    }

    pub fn authenticator(&self) -> Arc<Authenticator> {
        Arc::clone(&self.context.authenticator)
    }

    /// Bind the configured address and serve until Ctrl-C.
    pub async fn run(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received CTRL+C signal, shutting down");
                let _ = shutdown_tx.send(()).await;
            }
        });

        let listener =
            bind_with_retry(&self.settings.address, self.settings.bind_retry_backoff).await;
        self.run_with_shutdown(listener, shutdown_rx).await
    }

    /// Serve on `listener` until `shutdown_rx` fires or its sender is dropped.
    pub async fn run_with_shutdown(
        self,
        listener: TcpListener,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) -> Result<()> {
        let metrics = Arc::clone(&self.context.metrics);
        let interval = self.settings.metrics_interval;
        let mut metrics_tick = (!interval.is_zero()).then(|| {
            tokio::time::interval_at(tokio::time::Instant::now() + interval, interval)
        });

        info!(addr = ?listener.local_addr().ok(), "Gateway accepting frames");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutting down gateway. Waiting for connections to close...");
                    self.drain(&metrics).await;
                    metrics.log_metrics();
                    return Ok(());
                }

                _ = async {
                    match metrics_tick.as_mut() {
                        Some(tick) => { tick.tick().await; }
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    metrics.log_metrics();
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer)) => {
                            let context = Arc::clone(&self.context);
                            context.metrics.connection_established();

                            tokio::spawn(async move {
                                match handle_connection(stream, peer, &context).await {
                                    Ok(_) => {}
                                    Err(e) if e.is_rejection() => {
                                        info!(%peer, error = %e, "Frame rejected");
                                        context.metrics.record_error(&e);
                                    }
                                    Err(e) => {
                                        warn!(%peer, error = %e, "Connection failed");
                                        context.metrics.record_error(&e);
                                    }
                                }
                                context.metrics.connection_closed();
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Error accepting connection");
                        }
                    }
                }
            }
        }
    }

    async fn drain(&self, metrics: &Metrics) {
        let timeout = tokio::time::sleep(self.settings.shutdown_timeout);
        tokio::pin!(timeout);

        loop {
            let connections = metrics.connections_active.load(Ordering::Relaxed);
            if connections == 0 {
                info!("All connections closed, shutting down");
                return;
            }

            tokio::select! {
                _ = &mut timeout => {
                    warn!(connections, "Shutdown timeout reached, forcing exit");
                    return;
                }
                _ = tokio::time::sleep(Duration::from_millis(50)) => {
                    debug!(connections, "Waiting for connections to close");
                }
            }
        }
    }
}

/// Read one frame from `stream`, authenticate it and actuate the command.
#[instrument(skip(stream, peer, context), fields(%peer))]
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    context: &ConnectionContext,
) -> Result<AuthenticatedCommand> {
    let codec = PackageCodec::with_max_frame_bytes(context.max_frame_bytes);
    let mut reader = FramedRead::new(stream, codec);

    let frame = with_timeout_error(
        async {
            reader
                .next()
                .await
                .transpose()?
                .ok_or(GatewayError::ConnectionClosed)
        },
        context.receive_timeout,
    )
    .await?;

    context.metrics.frame_received(frame.len() as u64);
    trace!(frame = %hex::encode(&frame), "Received frame");

    let command = context.authenticator.authenticate(&frame)?;
    context.metrics.accepted();

    let device = context
        .authenticator
        .registry()
        .get(command.device)
        .map(|d| d.name().to_string())
        .unwrap_or_default();
    info!(%device, action = %command.action, sequence = command.sequence, "Command accepted");

    if let Err(e) = context.dispatcher.dispatch(&command) {
        context.metrics.dispatch_error();
        error!(%device, action = %command.action, error = %e, "Failed to actuate command");
    }

    Ok(command)
}

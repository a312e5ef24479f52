//! Observability and Metrics
//!
//! Counters for the gateway's connection and authentication outcomes.
//!
//! Uses atomic counters for thread-safe metrics collection.

use crate::error::GatewayError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for gateway operations
#[derive(Debug)]
pub struct Metrics {
    /// Total connections accepted
    pub connections_total: AtomicU64,
    /// Currently open connections
    pub connections_active: AtomicU64,
    /// Frames handed to the authenticator
    pub frames_received: AtomicU64,
    /// Total bytes received
    pub bytes_received: AtomicU64,
    /// Frames with the wrong size or layout
    pub frames_malformed: AtomicU64,
    /// Frames with an unrecognized action byte
    pub frames_unknown_action: AtomicU64,
    /// Frames accepted from a registered device
    pub auth_accepted: AtomicU64,
    /// Well-formed frames no device validated
    pub auth_rejected: AtomicU64,
    /// Actuator failures after a successful authentication
    pub dispatch_errors: AtomicU64,
    /// Connection-level failures (timeouts, resets, oversized input)
    pub connection_errors: AtomicU64,
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            frames_malformed: AtomicU64::new(0),
            frames_unknown_action: AtomicU64::new(0),
            auth_accepted: AtomicU64::new(0),
            auth_rejected: AtomicU64::new(0),
            dispatch_errors: AtomicU64::new(0),
            connection_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn connection_established(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn frame_received(&self, byte_count: u64) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn accepted(&self) {
        self.auth_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a failed authentication or connection under its category.
    pub fn record_error(&self, error: &GatewayError) {
        let counter = match error {
            GatewayError::MalformedFrame { .. } => &self.frames_malformed,
            GatewayError::UnknownAction(_) => &self.frames_unknown_action,
            GatewayError::AuthenticationFailed => &self.auth_rejected,
            _ => &self.connection_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        debug!(error = %error, "Recorded gateway error");
    }

    pub fn dispatch_error(&self) {
        self.dispatch_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            frames_malformed: self.frames_malformed.load(Ordering::Relaxed),
            frames_unknown_action: self.frames_unknown_action.load(Ordering::Relaxed),
            auth_accepted: self.auth_accepted.load(Ordering::Relaxed),
            auth_rejected: self.auth_rejected.load(Ordering::Relaxed),
            dispatch_errors: self.dispatch_errors.load(Ordering::Relaxed),
            connection_errors: self.connection_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            connections_total = snapshot.connections_total,
            connections_active = snapshot.connections_active,
            frames_received = snapshot.frames_received,
            bytes_received = snapshot.bytes_received,
            frames_malformed = snapshot.frames_malformed,
            frames_unknown_action = snapshot.frames_unknown_action,
            auth_accepted = snapshot.auth_accepted,
            auth_rejected = snapshot.auth_rejected,
            dispatch_errors = snapshot.dispatch_errors,
            connection_errors = snapshot.connection_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Gateway metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_total: u64,
    pub connections_active: u64,
    pub frames_received: u64,
    pub bytes_received: u64,
    pub frames_malformed: u64,
    pub frames_unknown_action: u64,
    pub auth_accepted: u64,
    pub auth_rejected: u64,
    pub dispatch_errors: u64,
    pub connection_errors: u64,
    pub uptime_seconds: u64,
}

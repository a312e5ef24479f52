//! # Configuration Management
//!
//! Centralized configuration for the gateway.
//!
//! This module provides structured configuration for the listener, the
//! authentication windows, the provisioned devices and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides (`KEYFOB_GATEWAY_*`)
//!
//! ## Security Considerations
//! - Device secrets are hex strings in the file; keep it readable only by the
//!   gateway user
//! - A freshness tolerance approaching half the period accepts nearly any stamp
//! - A replay window approaching 2^15 lets old codes look like future ones

use crate::auth::freshness::{FreshnessWindow, DEFAULT_PERIOD, DEFAULT_TOLERANCE, ROTATION};
use crate::auth::replay::{ReplayWindow, DEFAULT_REPLAY_WINDOW};
use crate::auth::{DeviceRegistry, DeviceSecret};
use crate::core::codec::DEFAULT_MAX_FRAME_BYTES;
use crate::core::package::FRAME_SIZE;
use crate::error::{GatewayError, Result};
use crate::utils::timeout;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Port the fob firmware transmits to.
pub const DEFAULT_PORT: u16 = 10001;

/// Main gateway configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GatewayConfig {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Freshness and replay tuning
    #[serde(default)]
    pub auth: AuthConfig,

    /// Provisioned devices, in scan order
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| GatewayError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| GatewayError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| GatewayError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override fields from `KEYFOB_GATEWAY_*` environment variables.
    /// Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("KEYFOB_GATEWAY_ADDRESS") {
            self.server.address = addr;
        }

        if let Ok(timeout) = std::env::var("KEYFOB_GATEWAY_RECEIVE_TIMEOUT_MS") {
            if let Ok(val) = timeout.parse::<u64>() {
                self.server.receive_timeout = Duration::from_millis(val);
            }
        }

        if let Ok(tolerance) = std::env::var("KEYFOB_GATEWAY_FRESHNESS_TOLERANCE") {
            if let Ok(val) = tolerance.parse::<u16>() {
                self.auth.freshness_tolerance = val;
            }
        }

        if let Ok(window) = std::env::var("KEYFOB_GATEWAY_REPLAY_WINDOW") {
            if let Ok(val) = window.parse::<u16>() {
                self.auth.replay_window = val;
            }
        }

        if let Ok(level) = std::env::var("KEYFOB_GATEWAY_LOG_LEVEL") {
            if let Ok(val) = Level::from_str(&level) {
                self.logging.log_level = val;
            }
        }
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        let example = Self::default_with_overrides(|config| {
            config.devices.push(DeviceConfig {
                name: "car-key-1".to_string(),
                secret: "00".repeat(32),
                initial_sequence: 0,
            });
        });
        toml::to_string_pretty(&example)
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| GatewayError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| GatewayError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.server.validate());
        errors.extend(self.auth.validate());
        errors.extend(validate_devices(&self.devices));
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(GatewayError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }

    /// Build the device registry in configuration order.
    pub fn build_registry(&self) -> Result<DeviceRegistry> {
        let mut registry = DeviceRegistry::new();
        for device in &self.devices {
            let secret = DeviceSecret::from_hex(&device.secret)?;
            registry.register(device.name.clone(), secret, device.initial_sequence);
        }
        Ok(registry)
    }
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:10001")
    pub address: String,

    /// Time a connection has to deliver its frame and close
    #[serde(with = "duration_serde")]
    pub receive_timeout: Duration,

    /// Delay between bind attempts while the address is unavailable
    #[serde(with = "duration_serde")]
    pub bind_retry_backoff: Duration,

    /// Grace period for in-flight connections on shutdown
    #[serde(with = "duration_serde")]
    pub shutdown_timeout: Duration,

    /// Bytes buffered per connection before it is dropped
    pub max_frame_bytes: usize,

    /// Interval for logging a metrics snapshot, 0 disables it
    #[serde(with = "duration_serde")]
    pub metrics_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: format!("0.0.0.0:{DEFAULT_PORT}"),
            receive_timeout: timeout::RECEIVE_TIMEOUT,
            bind_retry_backoff: timeout::BIND_RETRY_BACKOFF,
            shutdown_timeout: timeout::SHUTDOWN_TIMEOUT,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            metrics_interval: Duration::from_secs(300),
        }
    }
}

impl ServerConfig {
    /// Validate listener configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Server address cannot be empty".to_string());
        } else if self.address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid server address format: '{}' (expected format: '0.0.0.0:10001')",
                self.address
            ));
        }

        if self.receive_timeout.as_millis() < 100 {
            errors.push("Receive timeout too short (minimum: 100ms)".to_string());
        } else if self.receive_timeout.as_secs() > 300 {
            errors.push("Receive timeout too long (maximum: 300s)".to_string());
        }

        if self.bind_retry_backoff.as_millis() < 10 {
            errors.push("Bind retry backoff too short (minimum: 10ms)".to_string());
        } else if self.bind_retry_backoff.as_secs() > 60 {
            errors.push("Bind retry backoff too long (maximum: 60s)".to_string());
        }

        if self.shutdown_timeout.as_secs() < 1 {
            errors.push("Shutdown timeout too short (minimum: 1s)".to_string());
        } else if self.shutdown_timeout.as_secs() > 60 {
            errors.push("Shutdown timeout too long (maximum: 60s)".to_string());
        }

        if self.max_frame_bytes < FRAME_SIZE {
            errors.push(format!(
                "Max frame bytes too small: {} (minimum: {FRAME_SIZE})",
                self.max_frame_bytes
            ));
        } else if self.max_frame_bytes > 64 * 1024 {
            errors.push(format!(
                "Max frame bytes too large: {} (maximum: 65536)",
                self.max_frame_bytes
            ));
        }

        errors
    }
}

/// Freshness and replay tuning
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Exclusive bound on the distance between the frame stamp and the
    /// gateway's reduced time
    pub freshness_tolerance: u16,

    /// Length of the rotating time domain; must divide 21600
    pub freshness_period: u16,

    /// Sequences accepted ahead of the last accepted one
    pub replay_window: u16,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            freshness_tolerance: DEFAULT_TOLERANCE,
            freshness_period: DEFAULT_PERIOD,
            replay_window: DEFAULT_REPLAY_WINDOW,
        }
    }
}

impl AuthConfig {
    pub fn freshness_window(&self) -> FreshnessWindow {
        FreshnessWindow::new(self.freshness_period, self.freshness_tolerance)
    }

    pub fn replay_window(&self) -> ReplayWindow {
        ReplayWindow::new(self.replay_window)
    }

    /// Validate authentication tuning
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.freshness_period == 0 {
            errors.push("Freshness period must be greater than 0".to_string());
        } else if ROTATION % self.freshness_period != 0 {
            errors.push(format!(
                "Freshness period {} must divide the {ROTATION}-unit daily rotation",
                self.freshness_period
            ));
        } else if self.freshness_tolerance >= self.freshness_period / 2 {
            errors.push(format!(
                "Freshness tolerance {} must be less than half the period ({})",
                self.freshness_tolerance, self.freshness_period
            ));
        }

        if self.replay_window == 0 {
            errors.push("Replay window must be greater than 0".to_string());
        } else if self.replay_window >= 1 << 15 {
            errors.push(format!(
                "Replay window too large: {} (maximum: 32767)",
                self.replay_window
            ));
        }

        errors
    }
}

/// One provisioned device
#[derive(Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Label used in logs; defaults to `device-<index>`
    #[serde(default)]
    pub name: String,

    /// 32-byte shared secret as hex
    pub secret: String,

    /// Last sequence considered used at startup
    #[serde(default)]
    pub initial_sequence: u16,
}

impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .field("initial_sequence", &self.initial_sequence)
            .finish()
    }
}

fn validate_devices(devices: &[DeviceConfig]) -> Vec<String> {
    let mut errors = Vec::new();

    if devices.is_empty() {
        errors.push("At least one device must be configured".to_string());
    }

    let mut seen = HashSet::new();
    for (index, device) in devices.iter().enumerate() {
        let label = if device.name.is_empty() {
            format!("device-{index}")
        } else {
            device.name.clone()
        };

        match DeviceSecret::from_hex(&device.secret) {
            Ok(_) => {
                if !seen.insert(device.secret.trim().to_ascii_lowercase()) {
                    errors.push(format!("Device '{label}' reuses another device's secret"));
                }
            }
            Err(e) => errors.push(format!("Device '{label}': {e}")),
        }
    }

    errors
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to log to console
    pub log_to_console: bool,

    /// Whether to log to file
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("keyfob-gateway"),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        if self.log_to_file {
            if let Some(ref path) = self.log_file_path {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        errors.push(format!(
                            "Log file directory does not exist: {}",
                            parent.display()
                        ));
                    }
                }
            } else {
                errors.push("log_file_path must be specified when log_to_file is true".to_string());
            }
        }

        if !self.log_to_console && !self.log_to_file {
            errors
                .push("At least one logging output (console or file) must be enabled".to_string());
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        level.as_str().to_lowercase().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}

//! Integration tests for configuration validation

#![allow(clippy::expect_used, clippy::unwrap_used)]

use keyfob_gateway::config::{DeviceConfig, GatewayConfig};
use std::time::Duration;

const SECRET_A: &str = "14523170731EC3E1F8F01D30688B915A4C8877CA50D59F6D1A09F01A40E5EF59";
const SECRET_B: &str = "14523170731EC3E1F8F01D30688B915A4C8877CA50D59F6D1A09F01A40E5EF58";

fn device(name: &str, secret: &str) -> DeviceConfig {
    DeviceConfig {
        name: name.to_string(),
        secret: secret.to_string(),
        initial_sequence: 0,
    }
}

fn valid_config() -> GatewayConfig {
    GatewayConfig::default_with_overrides(|config| {
        config.devices.push(device("car", SECRET_A));
    })
}

#[test]
fn test_config_with_one_device_validates() {
    let errors = valid_config().validate();
    assert!(
        errors.is_empty(),
        "Config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_default_config_requires_devices() {
    let errors = GatewayConfig::default().validate();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].contains("At least one device"));
}

#[test]
fn test_invalid_server_address() {
    let mut config = valid_config();
    config.server.address = "invalid_address".to_string();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Invalid server address")));
}

#[test]
fn test_empty_server_address() {
    let mut config = valid_config();
    config.server.address = String::new();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_receive_timeout_bounds() {
    let mut config = valid_config();
    config.server.receive_timeout = Duration::from_millis(50);
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Receive timeout too short")));

    config.server.receive_timeout = Duration::from_secs(301);
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Receive timeout too long")));
}

#[test]
fn test_bind_retry_backoff_bounds() {
    let mut config = valid_config();
    config.server.bind_retry_backoff = Duration::from_millis(1);
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Bind retry backoff too short")));

    config.server.bind_retry_backoff = Duration::from_secs(61);
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Bind retry backoff too long")));
}

#[test]
fn test_shutdown_timeout_bounds() {
    let mut config = valid_config();
    config.server.shutdown_timeout = Duration::from_millis(500);
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Shutdown timeout too short")));
}

#[test]
fn test_max_frame_bytes_must_fit_a_frame() {
    let mut config = valid_config();
    config.server.max_frame_bytes = 38;
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Max frame bytes too small")));

    config.server.max_frame_bytes = 39;
    assert!(config.validate().is_empty());

    config.server.max_frame_bytes = 1 << 20;
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Max frame bytes too large")));
}

#[test]
fn test_freshness_tolerance_against_period() {
    let mut config = valid_config();
    config.auth.freshness_tolerance = 10_800;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("must be less than half the period")));
}

#[test]
fn test_zero_freshness_period() {
    let mut config = valid_config();
    config.auth.freshness_period = 0;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Freshness period must be greater than 0")));
}

#[test]
fn test_freshness_period_must_divide_rotation() {
    let mut config = valid_config();
    for period in [30_000, 21_601, 7_000] {
        config.auth.freshness_period = period;
        let errors = config.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.contains("must divide the 21600-unit daily rotation")),
            "period {period}: {errors:?}"
        );
    }

    for period in [21_600, 10_800, 3_600] {
        config.auth.freshness_period = period;
        assert!(config.validate().is_empty(), "period {period}");
    }
}

#[test]
fn test_replay_window_bounds() {
    let mut config = valid_config();
    config.auth.replay_window = 0;
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Replay window must be greater than 0")));

    config.auth.replay_window = 40_000;
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Replay window too large")));
}

#[test]
fn test_bad_device_secret_named_in_error() {
    let mut config = valid_config();
    config.devices.push(device("spare", "abc"));
    config.devices.push(device("", "zz".repeat(32).as_str()));

    let errors = config.validate();
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors[0].contains("Device 'spare'"));
    assert!(errors[1].contains("Device 'device-2'"));
}

#[test]
fn test_duplicate_secret_rejected() {
    let mut config = valid_config();
    config.devices.push(device("copy", &SECRET_A.to_lowercase()));

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Device 'copy' reuses another device's secret")));
}

#[test]
fn test_empty_app_name() {
    let mut config = valid_config();
    config.logging.app_name = String::new();

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Application name cannot be empty")));
}

#[test]
fn test_log_to_file_without_path() {
    let mut config = valid_config();
    config.logging.log_to_file = true;
    config.logging.log_file_path = None;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("log_file_path must be specified")));
}

#[test]
fn test_no_logging_outputs() {
    let mut config = valid_config();
    config.logging.log_to_console = false;
    config.logging.log_to_file = false;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("At least one logging output")));
}

#[test]
fn test_validate_strict_with_invalid_config() {
    let mut config = valid_config();
    config.server.address = String::new();
    config.auth.replay_window = 0;

    let err = config.validate_strict().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Configuration validation failed"));
    assert!(message.contains("cannot be empty"));
    assert!(message.contains("Replay window"));
}

#[test]
fn test_save_and_reload_from_file() {
    let mut config = valid_config();
    config.devices.push(DeviceConfig {
        name: "spare".to_string(),
        secret: SECRET_B.to_string(),
        initial_sequence: 4_000,
    });

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gateway.toml");
    config.save_to_file(&path).unwrap();

    let loaded = GatewayConfig::from_file(&path).unwrap();
    assert!(loaded.validate().is_empty());
    assert_eq!(loaded.server.address, config.server.address);
    assert_eq!(loaded.auth.replay_window, 1000);

    let registry = loaded.build_registry().unwrap();
    assert_eq!(registry.len(), 2);
    let spare = registry.iter().nth(1).unwrap();
    assert_eq!(spare.name(), "spare");
    assert_eq!(spare.last_accepted_sequence(), 4_000);
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = GatewayConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to open config file"));
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config = GatewayConfig::from_toml(&format!(
        "[[devices]]\nsecret = \"{SECRET_A}\"\n"
    ))
    .unwrap();

    assert_eq!(config.server.address, "0.0.0.0:10001");
    assert_eq!(config.auth.freshness_tolerance, 20);
    assert_eq!(config.auth.freshness_period, 21600);
    assert!(config.validate().is_empty());
}

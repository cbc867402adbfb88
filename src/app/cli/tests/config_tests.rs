//! Tests for configuration file loading and settings resolution

use crate::app::cli::api::*;
use crate::app::error::AppError;
use crate::decoder::api::{CameraFacing, LineSource};
use crate::verify::api::{DEFAULT_ENDPOINT, DEFAULT_VERIFY_TIMEOUT};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

fn table(toml_text: &str) -> toml::Table {
    toml::from_str(toml_text).expect("valid TOML")
}

fn file_config(toml_text: &str) -> FileConfig {
    let mut config = FileConfig::default();
    config.apply_toml_values(&table(toml_text)).unwrap();
    config
}

#[test]
fn test_apply_toml_values() {
    let config = file_config(
        r#"
        endpoint = "https://tickets.example.com/api/ticket-verify"
        timeout = 20
        camera-timeout = 30
        camera = "front"
        highlight-region = false
        scan-rate = 5
        input = "/dev/ttyACM0"
        log-level = "debug"
        log-format = "json"
        log-file = "scan.log"
        color = false
        "#,
    );

    assert_eq!(
        config.endpoint.as_deref(),
        Some("https://tickets.example.com/api/ticket-verify")
    );
    assert_eq!(config.timeout, Some(20));
    assert_eq!(config.camera_timeout, Some(30));
    assert_eq!(config.camera, Some(CameraFacing::Front));
    assert_eq!(config.highlight_region, Some(false));
    assert_eq!(config.scan_rate, Some(5));
    assert_eq!(config.input.as_deref(), Some("/dev/ttyACM0"));
    assert_eq!(config.log_format.as_deref(), Some("json"));
    assert_eq!(config.log_file, Some(Some(PathBuf::from("scan.log"))));
    assert_eq!(config.color, Some(false));
}

#[test]
fn test_log_file_none_disables_file_logging() {
    let config = file_config(r#"log-file = "none""#);
    assert_eq!(config.log_file, Some(None));
}

#[test]
fn test_wrong_types_are_reported() {
    let mut config = FileConfig::default();
    let err = config
        .apply_toml_values(&table(r#"timeout = "ten""#))
        .unwrap_err();
    assert!(err.message().contains("timeout"));

    let err = config
        .apply_toml_values(&table(r#"camera = "rear""#))
        .unwrap_err();
    assert!(err.message().contains("rear"));

    assert!(config.apply_toml_values(&table("scan-rate = -1")).is_err());
}

#[test]
fn test_defaults_without_file_or_flags() {
    let config = RunConfig::resolve(&Args::new(), &ScanArgs::default(), &FileConfig::default())
        .unwrap();

    assert_eq!(config.verify.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(config.verify.timeout, DEFAULT_VERIFY_TIMEOUT);
    assert_eq!(config.session.verify_timeout, DEFAULT_VERIFY_TIMEOUT);
    assert_eq!(config.session.camera_timeout, Duration::from_secs(15));
    assert_eq!(config.session.options.preferred_camera, CameraFacing::Environment);
    assert!(config.session.options.highlight_region);
    assert_eq!(config.session.options.scan_rate_hint_fps, 25);
    assert_eq!(config.input, LineSource::Stdin);
    assert!(!config.once);
    assert_eq!(config.log.level, "warn");
    assert_eq!(config.log.format, "text");
    assert_eq!(config.log.file, None);
    assert_eq!(config.color, None);
}

#[test]
fn test_command_line_overrides_file() {
    let file = file_config(
        r#"
        endpoint = "https://file.example.com/verify"
        timeout = 20
        input = "/dev/ttyACM0"
        highlight-region = true
        color = true
        "#,
    );
    let args = Args {
        endpoint: Some("http://cli.example.com/verify".to_string()),
        no_color: true,
        ..Args::new()
    };
    let scan = ScanArgs {
        input: Some("-".to_string()),
        no_highlight: true,
        ..ScanArgs::default()
    };

    let config = RunConfig::resolve(&args, &scan, &file).unwrap();

    assert_eq!(config.verify.endpoint, "http://cli.example.com/verify");
    assert_eq!(config.verify.timeout, Duration::from_secs(20));
    assert_eq!(config.input, LineSource::Stdin);
    assert!(!config.session.options.highlight_region);
    assert_eq!(config.color, Some(false));
}

#[test]
fn test_invalid_values_are_rejected() {
    let args = Args {
        endpoint: Some("ftp://tickets.example.com".to_string()),
        ..Args::new()
    };
    assert!(RunConfig::resolve(&args, &ScanArgs::default(), &FileConfig::default()).is_err());

    let args = Args {
        timeout: Some(0),
        ..Args::new()
    };
    assert!(RunConfig::resolve(&args, &ScanArgs::default(), &FileConfig::default()).is_err());

    let scan = ScanArgs {
        camera_timeout: Some(301),
        ..ScanArgs::default()
    };
    assert!(RunConfig::resolve(&Args::new(), &scan, &FileConfig::default()).is_err());
}

#[test]
fn test_log_file_flag_none_overrides_file() {
    let file = file_config(r#"log-file = "scan.log""#);
    let args = Args {
        log_file: Some(PathBuf::from("none")),
        ..Args::new()
    };

    let config = RunConfig::resolve(&args, &ScanArgs::default(), &file).unwrap();
    assert_eq!(config.log.file, None);
}

#[tokio::test]
async fn test_load_explicit_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "endpoint = \"https://tickets.example.com/verify\"").unwrap();
    writeln!(file, "scan-rate = 0").unwrap();
    file.flush().unwrap();

    let config = FileConfig::load(Some(file.path())).await.unwrap();

    assert_eq!(
        config.endpoint.as_deref(),
        Some("https://tickets.example.com/verify")
    );
    assert_eq!(config.scan_rate, Some(0));
}

#[tokio::test]
async fn test_load_missing_explicit_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let err = FileConfig::load(Some(&missing)).await.unwrap_err();
    assert!(matches!(err, AppError::ConfigNotFound { .. }));
}

#[tokio::test]
async fn test_load_reports_parse_errors() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "endpoint = ").unwrap();
    file.flush().unwrap();

    let err = FileConfig::load(Some(file.path())).await.unwrap_err();
    assert!(matches!(err, AppError::ConfigRead { .. }));
}

#[test]
fn test_default_config_path_location() {
    if let Some(path) = default_config_path() {
        assert!(path.ends_with("Ticketscan/ticketscan.toml"));
    }
}

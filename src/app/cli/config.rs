//! TOML configuration file loading and final settings resolution
//!
//! Precedence is command line, then configuration file, then defaults.

use super::args::{Args, ScanArgs};
use crate::app::error::{AppError, AppResult};
use crate::core::validation::{validate_endpoint, validate_timeout_secs, ValidationError};
use crate::decoder::api::{CameraFacing, LineSource, ScanOptions, ScanTarget};
use crate::session::api::{SessionConfig, DEFAULT_CAMERA_TIMEOUT};
use crate::verify::api::{VerifyConfig, DEFAULT_ENDPOINT, DEFAULT_VERIFY_TIMEOUT};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const CONFIG_DIR_NAME: &str = "Ticketscan";
const CONFIG_FILE_NAME: &str = "ticketscan.toml";

/// Values read from the configuration file; `None` means not set there
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub timeout: Option<u64>,
    pub camera_timeout: Option<u64>,
    pub camera: Option<CameraFacing>,
    pub highlight_region: Option<bool>,
    pub scan_rate: Option<u32>,
    pub input: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    /// `Some(None)` when the file disables file logging explicitly
    pub log_file: Option<Option<PathBuf>>,
    pub color: Option<bool>,
}

/// `<config_dir>/Ticketscan/ticketscan.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

impl FileConfig {
    /// Load the configuration file
    ///
    /// An explicitly named file must exist. Without one, the default path is
    /// used when present and an empty configuration otherwise.
    pub async fn load(explicit: Option<&Path>) -> AppResult<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::ConfigNotFound {
                        path: path.to_path_buf(),
                    });
                }
                path.to_path_buf()
            }
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let contents =
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| AppError::ConfigRead {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
        let table = toml::from_str::<toml::Table>(&contents).map_err(|e| AppError::ConfigRead {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();
        config
            .apply_toml_values(&table)
            .map_err(|e| AppError::ConfigInvalid {
                path: path.clone(),
                source: e,
            })?;
        Ok(config)
    }

    /// Apply TOML values; unknown keys are ignored
    pub fn apply_toml_values(&mut self, config: &toml::Table) -> Result<(), ValidationError> {
        if let Some(endpoint) = string_field(config, "endpoint")? {
            self.endpoint = Some(endpoint);
        }
        if let Some(timeout) = seconds_field(config, "timeout")? {
            self.timeout = Some(timeout);
        }
        if let Some(timeout) = seconds_field(config, "camera-timeout")? {
            self.camera_timeout = Some(timeout);
        }
        if let Some(camera) = string_field(config, "camera")? {
            let facing = CameraFacing::from_str(&camera).map_err(|_| {
                ValidationError::new(&format!(
                    "Unknown camera '{}' (expected 'environment' or 'front')",
                    camera
                ))
            })?;
            self.camera = Some(facing);
        }
        if let Some(highlight) = bool_field(config, "highlight-region")? {
            self.highlight_region = Some(highlight);
        }
        if let Some(rate) = config.get("scan-rate") {
            let rate = rate
                .as_integer()
                .and_then(|r| u32::try_from(r).ok())
                .ok_or_else(|| {
                    ValidationError::new("'scan-rate' must be a non-negative integer")
                })?;
            self.scan_rate = Some(rate);
        }
        if let Some(input) = string_field(config, "input")? {
            self.input = Some(input);
        }
        if let Some(log_level) = string_field(config, "log-level")? {
            self.log_level = Some(log_level);
        }
        if let Some(log_format) = string_field(config, "log-format")? {
            self.log_format = Some(log_format);
        }
        if let Some(log_file) = string_field(config, "log-file")? {
            if log_file.eq_ignore_ascii_case("none") || log_file == "-" {
                self.log_file = Some(None);
            } else {
                self.log_file = Some(Some(PathBuf::from(log_file)));
            }
        }
        if let Some(color) = bool_field(config, "color")? {
            self.color = Some(color);
        }
        Ok(())
    }
}

fn string_field(config: &toml::Table, key: &str) -> Result<Option<String>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| ValidationError::new(&format!("'{}' must be a string", key))),
    }
}

fn bool_field(config: &toml::Table, key: &str) -> Result<Option<bool>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_bool()
            .map(Some)
            .ok_or_else(|| ValidationError::new(&format!("'{}' must be true or false", key))),
    }
}

fn seconds_field(config: &toml::Table, key: &str) -> Result<Option<u64>, ValidationError> {
    match config.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_integer()
            .and_then(|s| u64::try_from(s).ok())
            .map(Some)
            .ok_or_else(|| {
                ValidationError::new(&format!("'{}' must be a whole number of seconds", key))
            }),
    }
}

/// Logging settings after merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub format: String,
    pub file: Option<PathBuf>,
}

/// Everything startup needs, validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub verify: VerifyConfig,
    pub session: SessionConfig,
    pub input: LineSource,
    pub once: bool,
    pub log: LogSettings,
    /// None leaves the decision to the terminal
    pub color: Option<bool>,
}

impl RunConfig {
    pub fn resolve(
        args: &Args,
        scan: &ScanArgs,
        file: &FileConfig,
    ) -> Result<Self, ValidationError> {
        let endpoint = args
            .endpoint
            .as_deref()
            .or(file.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT);
        let endpoint = validate_endpoint(endpoint)?;

        let verify_timeout = match args.timeout.or(file.timeout) {
            Some(secs) => validate_timeout_secs("Verification timeout", secs)?,
            None => DEFAULT_VERIFY_TIMEOUT,
        };
        let camera_timeout = match scan.camera_timeout.or(file.camera_timeout) {
            Some(secs) => validate_timeout_secs("Camera timeout", secs)?,
            None => DEFAULT_CAMERA_TIMEOUT,
        };

        let defaults = ScanOptions::default();
        let options = ScanOptions {
            preferred_camera: scan
                .camera
                .or(file.camera)
                .unwrap_or(defaults.preferred_camera),
            highlight_region: !scan.no_highlight
                && file.highlight_region.unwrap_or(defaults.highlight_region),
            scan_rate_hint_fps: scan
                .scan_rate
                .or(file.scan_rate)
                .unwrap_or(defaults.scan_rate_hint_fps),
        };

        let input = scan
            .input
            .as_deref()
            .or(file.input.as_deref())
            .map(LineSource::parse)
            .unwrap_or(LineSource::Stdin);

        let log_file = match &args.log_file {
            Some(path) if is_disabled_path(path) => None,
            Some(path) => Some(path.clone()),
            None => file.log_file.clone().flatten(),
        };

        Ok(Self {
            verify: VerifyConfig {
                endpoint,
                timeout: verify_timeout,
            },
            session: SessionConfig {
                target: ScanTarget::Headless,
                options,
                camera_timeout,
                verify_timeout,
            },
            input,
            once: scan.once,
            log: LogSettings {
                level: args
                    .log_level
                    .clone()
                    .or_else(|| file.log_level.clone())
                    .unwrap_or_else(|| "warn".to_string()),
                format: args
                    .log_format
                    .clone()
                    .or_else(|| file.log_format.clone())
                    .unwrap_or_else(|| "text".to_string()),
                file: log_file,
            },
            color: args.color_preference().or(file.color),
        })
    }
}

fn is_disabled_path(path: &Path) -> bool {
    path.to_str()
        .map(|p| p.eq_ignore_ascii_case("none") || p == "-")
        .unwrap_or(false)
}

//! Validation errors and helpers for configuration values

use std::time::Duration;
use thiserror::Error;

/// Upper bound accepted for any configured timeout
pub const MAX_TIMEOUT_SECS: u64 = 300;

/// A configuration value that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl crate::core::error_handling::ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

/// Validate a verification endpoint: must be an absolute http(s) URL
pub fn validate_endpoint(endpoint: &str) -> Result<String, ValidationError> {
    let trimmed = endpoint.trim();
    let rest = trimmed
        .strip_prefix("http://")
        .or_else(|| trimmed.strip_prefix("https://"))
        .ok_or_else(|| {
            ValidationError::new(&format!(
                "Endpoint '{}' must start with http:// or https://",
                trimmed
            ))
        })?;

    if rest.is_empty() || rest.starts_with('/') {
        return Err(ValidationError::new(&format!(
            "Endpoint '{}' has no host",
            trimmed
        )));
    }

    Ok(trimmed.to_string())
}

/// Validate a timeout given in seconds (1..=MAX_TIMEOUT_SECS)
pub fn validate_timeout_secs(name: &str, secs: u64) -> Result<Duration, ValidationError> {
    match secs {
        0 => Err(ValidationError::new(&format!(
            "{} must be greater than 0 seconds",
            name
        ))),
        s if s > MAX_TIMEOUT_SECS => Err(ValidationError::new(&format!(
            "{} must be at most {} seconds (got {})",
            name, MAX_TIMEOUT_SECS, s
        ))),
        s => Ok(Duration::from_secs(s)),
    }
}

//! Application level errors

use crate::core::error_handling::ContextualError;
use crate::core::validation::ValidationError;
use crate::session::api::SessionError;
use crate::verify::api::VerifyError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("The specified configuration file does not exist: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Error reading configuration file {}: {reason}", path.display())]
    ConfigRead { path: PathBuf, reason: String },

    #[error("Error in configuration file {}: {source}", path.display())]
    ConfigInvalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to initialise logging: {reason}")]
    Logging { reason: String },

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ContextualError for AppError {
    fn is_user_actionable(&self) -> bool {
        match self {
            AppError::ConfigNotFound { .. }
            | AppError::ConfigRead { .. }
            | AppError::ConfigInvalid { .. }
            | AppError::Validation(_) => true,
            AppError::Logging { .. } => false,
            AppError::Verify(e) => e.is_user_actionable(),
            AppError::Session(e) => e.is_user_actionable(),
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            AppError::ConfigInvalid { source, .. } => Some(source.message()),
            AppError::Validation(e) => Some(e.message()),
            AppError::ConfigNotFound { .. } | AppError::ConfigRead { .. } => {
                Some("Configuration file could not be loaded")
            }
            AppError::Logging { .. } => None,
            AppError::Verify(e) => e.user_message(),
            AppError::Session(e) => e.user_message(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

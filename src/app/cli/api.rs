//! Public API exports for the CLI module

pub use crate::app::cli::args::{Args, Command, ScanArgs, VerifyArgs};
pub use crate::app::cli::config::{default_config_path, FileConfig, LogSettings, RunConfig};

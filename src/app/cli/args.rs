//! Command line arguments
//!
//! Global options apply to every subcommand. Values left unset here fall
//! back to the configuration file, then to built-in defaults.

use crate::decoder::api::CameraFacing;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "ticketscan")]
#[command(about = "Scan a ticket code and verify it against the ticket service")]
#[command(version)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Ticket verification endpoint (http:// or https://)
    #[arg(short = 'e', long = "endpoint", value_name = "URL", global = true)]
    pub endpoint: Option<String>,

    /// Verification request timeout in seconds
    #[arg(short = 't', long = "timeout", value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Force coloured output
    #[arg(long = "color", overrides_with = "no_color", global = true)]
    pub color: bool,

    /// Disable coloured output
    #[arg(long = "no-color", overrides_with = "color", global = true)]
    pub no_color: bool,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", global = true, value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", global = true, value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// More log output (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less log output (repeatable)
    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Read codes from a scanner and verify them (default)
    Scan(ScanArgs),
    /// Verify one scanned text without a scanner
    Verify(VerifyArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Scanner input: a device or capture file, or '-' for stdin
    #[arg(short = 'i', long = "input", value_name = "PATH")]
    pub input: Option<String>,

    /// Stop after the first outcome
    #[arg(long = "once")]
    pub once: bool,

    /// Preferred camera (environment or front)
    #[arg(long = "camera", value_name = "FACING")]
    pub camera: Option<CameraFacing>,

    /// Do not outline the scan region
    #[arg(long = "no-highlight")]
    pub no_highlight: bool,

    /// Maximum decode attempts per second (0 for unlimited)
    #[arg(long = "scan-rate", value_name = "FPS")]
    pub scan_rate: Option<u32>,

    /// Camera acquisition timeout in seconds
    #[arg(long = "camera-timeout", value_name = "SECONDS")]
    pub camera_timeout: Option<u64>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Scanned text: a JSON object, or a bare ticket id
    #[arg(value_name = "TEXT")]
    pub text: String,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// `-v` count minus `-q` count
    pub fn verbosity(&self) -> i8 {
        (self.verbose as i16 - self.quiet as i16).clamp(i8::MIN as i16, i8::MAX as i16) as i8
    }

    /// Some(true) for --color, Some(false) for --no-color, None to decide from the terminal
    pub fn color_preference(&self) -> Option<bool> {
        match (self.color, self.no_color) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// The requested command, `scan` when none was given
    pub fn command_or_default(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Scan(ScanArgs::default()))
    }
}

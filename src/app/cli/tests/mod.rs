//! Tests for CLI argument parsing and configuration resolution

pub mod config_tests;

//! Command line and configuration file handling

pub mod api;
pub mod args;
pub mod config;

#[cfg(test)]
mod tests;

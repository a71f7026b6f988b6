//! `config`: print the resolved configuration as JSON.

use anyhow::{Context, Result};

use crate::config::{Config, ValidationResult};
use crate::ui;

/// Render the configuration as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render(config: &Config) -> Result<String> {
    serde_json::to_string_pretty(config).context("Failed to serialize configuration")
}

/// Render the configuration as single-line JSON, for logs.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn summary(config: &Config) -> Result<String> {
    serde_json::to_string(config).context("Failed to serialize configuration")
}

/// Print the configuration and its validation warnings.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn execute(config: &Config, validation: &ValidationResult) -> Result<()> {
    println!("{}", render(config)?);
    if validation.has_warnings() {
        ui::print_warnings(&validation.warnings);
    }
    Ok(())
}

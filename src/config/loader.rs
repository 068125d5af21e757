//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::CloserConfig;
use crate::config::validation::{validate_config, ConfigWarning};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load configuration from a TOML file.
///
/// Validation warnings are returned alongside the config; they never fail
/// the load.
pub fn load_config(path: &Path) -> Result<(CloserConfig, Vec<ConfigWarning>), ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: CloserConfig = toml::from_str(&content)?;
    let warnings = validate_config(&config);

    tracing::debug!(path = ?path, warnings = warnings.len(), "Configuration loaded");
    Ok((config, warnings))
}

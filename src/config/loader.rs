//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{JsonOverrides, LbConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a file.
///
/// `.json` files use the flat format (`algorithm`, `highUsageThreshold`,
/// `lowUsageThreshold`, `minPrimaryServers`) on top of the defaults; anything
/// else is parsed as TOML.
pub fn load_config(path: &Path) -> Result<LbConfig, ConfigError> {
    let content = fs::read_to_string(path)?;

    let config = if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        let overrides: JsonOverrides = serde_json::from_str(&content)?;
        let mut config = LbConfig::default();
        overrides.apply(&mut config);
        config
    } else {
        toml::from_str(&content)?
    };

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load configuration, falling back to the defaults on any failure.
///
/// The error, if any, is handed back so the caller can report it once
/// logging is up.
pub fn load_or_default(path: Option<&Path>) -> (LbConfig, Option<ConfigError>) {
    match path.map(load_config) {
        None => (LbConfig::default(), None),
        Some(Ok(config)) => (config, None),
        Some(Err(e)) => (LbConfig::default(), Some(e)),
    }
}

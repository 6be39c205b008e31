//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{AppConfig, Environment};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment override {name}: {message}")]
    Env { name: &'static str, message: String },

    #[error("Validation failed: {}", render(.0))]
    Validation(Vec<ValidationError>),
}

fn render(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse TOML without touching the environment.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load configuration: file (if any), then environment overrides, then
/// validation.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `APP_ENV` (falling back to `NODE_ENV`), `HOST` and `PORT` read
/// through `lookup`.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup("APP_ENV").or_else(|| lookup("NODE_ENV")) {
        config.environment = raw
            .parse::<Environment>()
            .map_err(|message| ConfigError::Env { name: "APP_ENV", message })?;
    }

    if let Some(host) = lookup("HOST") {
        config.listener.host = host;
    }

    if let Some(raw) = lookup("PORT") {
        config.listener.port = raw.trim().parse().map_err(|_| ConfigError::Env {
            name: "PORT",
            message: format!("'{raw}' is not a valid port"),
        })?;
    }

    Ok(())
}

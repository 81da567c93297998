//! Error types for configuration loading and resolution.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid config value for '{field}'{}", .hint.as_ref().map(|h| format!(": {h}")).unwrap_or_default())]
    InvalidValue { field: String, hint: Option<String> },

    #[error("invalid pattern '{source_text}': {message}")]
    InvalidPattern {
        source_text: String,
        message: String,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("no built-in config for target '{0}'")]
    MissingBuiltin(String),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Settings(err.to_string())
    }
}

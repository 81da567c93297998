//! Error handling for devhost.
//!
//! Fatal conditions (an unresolvable config, a second server instance, no
//! free port) are returned as [`DevError`]. Degraded-but-working outcomes
//! (port fallback, listen failure, dump failure) are logged where they happen
//! and never reach this type.
//!
//! # Example
//!
//! ```rust,no_run
//! use devhost::error::{Result, ResultExt};
//!
//! fn working_dir() -> Result<std::path::PathBuf> {
//!     std::env::current_dir().context("Failed to read the current directory")
//! }
//! ```

use devhost_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DevError {
    /// Config could not be resolved (missing/broken base or custom config)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `start` was called while the owner already runs a server
    #[error("Multi webpack dev server instance found")]
    MultiInstance,

    /// No free port in the searched range
    #[error("No available port in {start}-{end}\n\nHint: free a port in that range or configure bundler.dev_server.port")]
    PortsExhausted { start: u16, end: u16 },

    /// The bundler refused to create a compiler or server
    #[error("Bundler error: {0}")]
    Bundler(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

pub type Result<T, E = DevError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<DevError>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: DevError = e.into();
            DevError::Custom(format!("{}: {}", msg, err))
        })
    }
}

/// Convert a [`DevError`] into a miette report for the binary.
pub fn to_miette(err: DevError) -> miette::Report {
    match err {
        DevError::Config(e) => miette::miette!("Configuration error: {}", e),
        other => miette::miette!("{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn multi_instance_message() {
        assert_eq!(
            DevError::MultiInstance.to_string(),
            "Multi webpack dev server instance found"
        );
    }

    #[test]
    fn ports_exhausted_names_range() {
        let msg = DevError::PortsExhausted {
            start: 6002,
            end: 6012,
        }
        .to_string();
        assert!(msg.contains("6002-6012"));
        assert!(msg.contains("Hint:"));
    }

    #[test]
    fn config_error_converts() {
        let err: DevError = ConfigError::NotFound(PathBuf::from("custom.toml")).into();
        assert!(matches!(err, DevError::Config(_)));
    }

    #[test]
    fn context_prefixes_message() {
        let result: std::result::Result<(), ConfigError> =
            Err(ConfigError::NotFound(PathBuf::from("x.toml")));
        let msg = result.context("Failed to resolve config").unwrap_err().to_string();
        assert!(msg.starts_with("Failed to resolve config: "));
    }
}

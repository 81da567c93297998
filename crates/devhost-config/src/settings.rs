//! Application-level settings for the dev-server orchestrator.
//!
//! Loaded from multiple sources, later ones winning:
//! serialized defaults → `devhost.toml` → `DEVHOST_*` environment variables
//! (`__` separates nesting levels, e.g. `DEVHOST_BUNDLER__DEV_SERVER__PORT`).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::resolved::ConfigWarning;

/// Settings file looked up in the working directory.
pub const SETTINGS_FILE: &str = "devhost.toml";

/// Environment name treated as production.
pub const PRODUCTION_ENV: &str = "prod";

/// Port used when no dev-server port is configured.
pub const DEFAULT_PORT: u16 = 6002;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Runtime environment name (`local`, `unittest`, `prod`, ...)
    pub env: String,

    /// Directory for runtime artifacts such as the config dump
    pub rundir: PathBuf,

    pub bundler: BundlerSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            env: "local".to_string(),
            rundir: PathBuf::from("run"),
            bundler: BundlerSettings::default(),
        }
    }
}

impl AppSettings {
    /// Load settings for a project rooted at `cwd`.
    ///
    /// `file` overrides the default `devhost.toml` lookup and must exist.
    pub fn load(cwd: &Path, file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match file {
            Some(path) => {
                let path = if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    cwd.join(path)
                };
                if !path.exists() {
                    return Err(ConfigError::NotFound(path));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let default_path = cwd.join(SETTINGS_FILE);
                if default_path.exists() {
                    figment = figment.merge(Toml::file(default_path));
                }
            }
        }

        figment = figment.merge(Env::prefixed("DEVHOST_").split("__"));

        let settings: Self = figment.extract()?;
        tracing::debug!(env = %settings.env, rundir = %settings.rundir.display(), "settings loaded");
        Ok(settings)
    }

    pub fn is_dev(&self) -> bool {
        self.env != PRODUCTION_ENV
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlerSettings {
    /// Deprecated single-field custom config path; use `custom.config_path`.
    pub config: Option<PathBuf>,

    pub custom: CustomSettings,

    pub dev_server: DevServerOptions,
}

impl BundlerSettings {
    /// Path of the user's custom config, if any.
    ///
    /// The legacy `config` field still works and takes precedence, but comes
    /// with a deprecation warning.
    pub fn custom_config_path(&self) -> (Option<&Path>, Option<ConfigWarning>) {
        if let Some(legacy) = &self.config {
            let warning = ConfigWarning::Deprecated {
                option: "bundler.config".to_string(),
                replacement: "bundler.custom.config_path".to_string(),
            };
            return (Some(legacy.as_path()), Some(warning));
        }
        (self.custom.config_path.as_deref(), None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomSettings {
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevServerOptions {
    pub port: Option<u16>,

    /// Host the browser uses to reach the dev server
    pub host: String,

    /// Inject the live-reload client into every entry in development
    pub hot: bool,
}

impl Default for DevServerOptions {
    fn default() -> Self {
        Self {
            port: None,
            host: "localhost".to_string(),
            hot: true,
        }
    }
}

/// Which built-in base config to start from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    Browser,
    Node,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Browser => "browser",
            Target::Node => "node",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "browser" => Ok(Target::Browser),
            "node" => Ok(Target::Node),
            other => Err(ConfigError::InvalidValue {
                field: "target".to_string(),
                hint: Some(format!("expected 'browser' or 'node', got '{other}'")),
            }),
        }
    }
}

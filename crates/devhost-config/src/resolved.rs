//! Fully resolved bundler configuration.
//!
//! [`ResolvedConfig`] is the only form of configuration handed to a bundler.
//! It can only be built by [`ResolvedConfig::enforce`], which applies the
//! dev-server invariants:
//!
//! - `devServer.contentBase` is always `false`
//! - `devServer.port` falls back to the resolved port
//! - `devServer.publicPath` falls back to `output.publicPath`, then `/build`

use std::fmt;

use serde::{Serialize, Serializer};

use crate::entry::EntryMap;
use crate::error::{ConfigError, Result};
use crate::value::{ConfigMap, ConfigValue};

pub const DEFAULT_PUBLIC_PATH: &str = "/build";

/// Non-fatal corrections made while resolving a config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// Preferred port was taken; another one was picked.
    PortFallback { requested: u16, actual: u16 },
    /// A truthy `devServer.contentBase` was replaced with `false`.
    ContentBaseOverridden { value: String },
    /// A deprecated option was used.
    Deprecated {
        option: String,
        replacement: String,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::PortFallback { requested, actual } => {
                write!(f, "port {requested} is in use, using {actual} instead")
            }
            ConfigWarning::ContentBaseOverridden { value } => write!(
                f,
                "devServer.contentBase: {value}, a contentBase other than false may make the app server unreachable; forcing false"
            ),
            ConfigWarning::Deprecated {
                option,
                replacement,
            } => write!(f, "`{option}` is deprecated, use `{replacement}` instead"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputConfig {
    pub public_path: Option<String>,
    pub rest: ConfigMap,
}

/// Dev-server section. `contentBase` is not stored: it is always `false`.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct DevServerConfig {
    pub port: u16,
    pub public_path: String,
    pub rest: ConfigMap,
}

impl DevServerConfig {
    pub fn content_base(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct ResolvedConfig {
    pub entry: EntryMap,
    pub output: OutputConfig,
    pub dev_server: DevServerConfig,
    /// Every other top-level key, untouched.
    pub rest: ConfigMap,
}

impl ResolvedConfig {
    /// Turn a layered config tree into a resolved config.
    ///
    /// # Errors
    ///
    /// Fails when the tree is not a table, or when `entry`, `output` or
    /// `devServer` have shapes no bundler would accept.
    pub fn enforce(tree: ConfigValue, default_port: u16) -> Result<(Self, Vec<ConfigWarning>)> {
        let ConfigValue::Object(mut root) = tree else {
            return Err(ConfigError::InvalidValue {
                field: "config".to_string(),
                hint: Some("a bundler config must be a table".to_string()),
            });
        };
        let mut warnings = Vec::new();

        let entry = EntryMap::from_value(&root.shift_remove("entry").unwrap_or_default())?;

        let output = match root.shift_remove("output").unwrap_or_default() {
            ConfigValue::Null => OutputConfig::default(),
            ConfigValue::Object(mut rest) => {
                let public_path =
                    optional_string(rest.shift_remove("publicPath"), "output.publicPath")?;
                OutputConfig { public_path, rest }
            }
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "output".to_string(),
                    hint: Some("expected a table".to_string()),
                });
            }
        };

        let mut dev_server = match root.shift_remove("devServer").unwrap_or_default() {
            ConfigValue::Object(map) => map,
            value if !value.is_truthy() => ConfigMap::new(),
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "devServer".to_string(),
                    hint: Some("expected a table".to_string()),
                });
            }
        };

        let port = match dev_server.shift_remove("port").unwrap_or_default() {
            value if !value.is_truthy() => default_port,
            value => value
                .as_u64()
                .and_then(|p| u16::try_from(p).ok())
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "devServer.port".to_string(),
                    hint: Some(format!("expected a port number, got {value}")),
                })?,
        };

        if let Some(content_base) = dev_server.shift_remove("contentBase") {
            if content_base.is_truthy() {
                warnings.push(ConfigWarning::ContentBaseOverridden {
                    value: content_base.to_string(),
                });
            }
        }

        let public_path =
            optional_string(dev_server.shift_remove("publicPath"), "devServer.publicPath")?
                .or_else(|| output.public_path.clone())
                .unwrap_or_else(|| DEFAULT_PUBLIC_PATH.to_string());

        let config = ResolvedConfig {
            entry,
            output,
            dev_server: DevServerConfig {
                port,
                public_path,
                rest: dev_server,
            },
            rest: root,
        };

        Ok((config, warnings))
    }

    /// Config tree as handed to the bundler.
    pub fn to_value(&self) -> ConfigValue {
        let mut root = ConfigMap::with_capacity(self.rest.len() + 3);
        root.insert("entry".to_string(), self.entry.to_value());

        let mut output = ConfigMap::with_capacity(self.output.rest.len() + 1);
        if let Some(public_path) = &self.output.public_path {
            output.insert("publicPath".to_string(), ConfigValue::from(public_path.as_str()));
        }
        output.extend(self.output.rest.clone());
        root.insert("output".to_string(), ConfigValue::Object(output));

        let mut dev_server = ConfigMap::with_capacity(self.dev_server.rest.len() + 3);
        dev_server.insert("port".to_string(), ConfigValue::from(self.dev_server.port));
        dev_server.insert(
            "contentBase".to_string(),
            ConfigValue::from(self.dev_server.content_base()),
        );
        dev_server.insert(
            "publicPath".to_string(),
            ConfigValue::from(self.dev_server.public_path.as_str()),
        );
        dev_server.extend(self.dev_server.rest.clone());
        root.insert("devServer".to_string(), ConfigValue::Object(dev_server));

        root.extend(self.rest.clone());
        ConfigValue::Object(root)
    }
}

impl Serialize for ResolvedConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Falsy values count as unset; anything else truthy must be a string.
fn optional_string(value: Option<ConfigValue>, field: &str) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(value) if !value.is_truthy() => Ok(None),
        Some(ConfigValue::String(s)) => Ok(Some(s)),
        Some(other) => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            hint: Some(format!("expected a string, got {other}")),
        }),
    }
}

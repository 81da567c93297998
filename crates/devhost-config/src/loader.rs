//! Config file loading.
//!
//! A [`ConfigLoader`] turns a [`ConfigSource`] into a config tree. Base
//! configs receive the discovered entry map; custom configs receive the
//! previous layer as a seed so they can extend it instead of replacing it.
//!
//! [`FileConfigLoader`] is the stock implementation. It understands TOML and
//! JSON documents with two optional layering sections:
//!
//! - `profiles.development` / `profiles.production`, picked by the dev flag
//! - `targets.browser` / `targets.node`, picked by the build target
//!
//! Both sections are merged over the rest of the document before it is
//! layered onto the seed.

use std::fmt;
use std::path::{Path, PathBuf};

use rust_embed::RustEmbed;
use serde_json::Value;
use tracing::debug;

use crate::entry::EntryMap;
use crate::error::{ConfigError, Result};
use crate::settings::Target;
use crate::value::ConfigValue;

#[derive(RustEmbed)]
#[folder = "assets/targets"]
struct BuiltinConfigs;

/// Where a config layer comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in default for a target.
    Builtin(Target),
    /// User file, relative paths resolved against the project root.
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Builtin(target) => write!(f, "<builtin:{target}>"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Arguments passed along with a config layer.
#[derive(Debug, Clone, Copy)]
pub enum LoadArgs<'a> {
    Base { entry: &'a EntryMap, is_dev: bool },
    Custom {
        seed: &'a ConfigValue,
        is_dev: bool,
        target: Target,
    },
}

impl LoadArgs<'_> {
    fn is_dev(&self) -> bool {
        match self {
            LoadArgs::Base { is_dev, .. } | LoadArgs::Custom { is_dev, .. } => *is_dev,
        }
    }
}

/// Capability to load a config layer.
///
/// Implement this to plug in programmatic configs; the return value is the
/// whole config after this layer, not a diff.
pub trait ConfigLoader: Send + Sync {
    fn load(&self, source: &ConfigSource, args: LoadArgs<'_>) -> Result<ConfigValue>;
}

/// Loads built-in defaults and TOML/JSON files from disk.
#[derive(Debug, Clone)]
pub struct FileConfigLoader {
    root: PathBuf,
}

impl FileConfigLoader {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Read a source into a config tree without any layering applied.
    pub fn read_document(&self, source: &ConfigSource) -> Result<ConfigValue> {
        let json = match source {
            ConfigSource::Builtin(target) => {
                let name = format!("{target}.toml");
                let file = BuiltinConfigs::get(&name)
                    .ok_or_else(|| ConfigError::MissingBuiltin(target.to_string()))?;
                let content = String::from_utf8_lossy(file.data.as_ref()).into_owned();
                parse_toml(&content, Path::new(&name))?
            }
            ConfigSource::File(path) => {
                let path = self.resolve(path);
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path));
                }
                let content = std::fs::read_to_string(&path)?;
                match path.extension().and_then(|ext| ext.to_str()) {
                    Some("toml") => parse_toml(&content, &path)?,
                    Some("json") => {
                        serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                            path: path.clone(),
                            message: e.to_string(),
                        })?
                    }
                    other => {
                        return Err(ConfigError::UnsupportedFormat(
                            other.unwrap_or("<none>").to_string(),
                        ));
                    }
                }
            }
        };

        ConfigValue::from_json(json)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ConfigLoader for FileConfigLoader {
    fn load(&self, source: &ConfigSource, args: LoadArgs<'_>) -> Result<ConfigValue> {
        let document = self.read_document(source)?;
        let target = match (source, &args) {
            (_, LoadArgs::Custom { target, .. }) => Some(*target),
            (ConfigSource::Builtin(target), _) => Some(*target),
            _ => None,
        };
        let layer = flatten_sections(document, args.is_dev(), target)?;
        debug!(source = %source, is_dev = args.is_dev(), "config layer loaded");

        match args {
            LoadArgs::Base { entry, .. } => {
                let mut config = layer;
                let mut entries = ConfigValue::object();
                if let Some(map) = entries.as_object_mut() {
                    map.insert("entry".to_string(), entry.to_value());
                }
                config.merge(&entries);
                Ok(config)
            }
            LoadArgs::Custom { seed, .. } => {
                let mut config = seed.clone();
                config.merge(&layer);
                Ok(config)
            }
        }
    }
}

/// Apply `profiles.*` and `targets.*` sections onto the document body.
fn flatten_sections(document: ConfigValue, is_dev: bool, target: Option<Target>) -> Result<ConfigValue> {
    let ConfigValue::Object(mut body) = document else {
        return Err(ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: Some("a config document must be a table".to_string()),
        });
    };

    let profiles = body.shift_remove("profiles");
    let targets = body.shift_remove("targets");
    let mut config = ConfigValue::Object(body);

    let profile = if is_dev { "development" } else { "production" };
    if let Some(overlay) = profiles.as_ref().and_then(|p| p.get(profile)) {
        config.merge(overlay);
    }
    if let Some(target) = target {
        if let Some(overlay) = targets.as_ref().and_then(|t| t.get(target.as_str())) {
            config.merge(overlay);
        }
    }

    Ok(config)
}

fn parse_toml(content: &str, path: &Path) -> Result<Value> {
    let toml_val: toml::Value = toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    serde_json::to_value(toml_val).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: format!("TOML to JSON conversion failed: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_configs_parse_for_every_target() {
        let loader = FileConfigLoader::new(".");
        for target in [Target::Browser, Target::Node] {
            let doc = loader.read_document(&ConfigSource::Builtin(target)).unwrap();
            assert!(doc.get("output").is_some(), "{target} has no output section");
        }
    }

    #[test]
    fn profiles_pick_dev_or_production() {
        let loader = FileConfigLoader::new(".");
        let entry = EntryMap::new();

        let dev = loader
            .load(
                &ConfigSource::Builtin(Target::Browser),
                LoadArgs::Base {
                    entry: &entry,
                    is_dev: true,
                },
            )
            .unwrap();
        assert_eq!(dev.get("mode"), Some(&ConfigValue::from("development")));
        assert!(dev.get("profiles").is_none());

        let prod = loader
            .load(
                &ConfigSource::Builtin(Target::Browser),
                LoadArgs::Base {
                    entry: &entry,
                    is_dev: false,
                },
            )
            .unwrap();
        assert_eq!(prod.get("mode"), Some(&ConfigValue::from("production")));
    }

    #[test]
    fn source_display() {
        assert_eq!(
            ConfigSource::Builtin(Target::Node).to_string(),
            "<builtin:node>"
        );
    }
}

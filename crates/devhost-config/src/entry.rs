//! Entry map: bundle name to the source file(s) the bundle starts from.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::value::{ConfigMap, ConfigValue};

/// Bundle name used when an entry is given as a bare string or array.
pub const DEFAULT_ENTRY_NAME: &str = "main";

/// One or more sources for a single bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySources {
    Single(String),
    Many(Vec<String>),
}

impl EntrySources {
    pub fn paths(&self) -> Vec<&str> {
        match self {
            EntrySources::Single(path) => vec![path.as_str()],
            EntrySources::Many(paths) => paths.iter().map(String::as_str).collect(),
        }
    }

    /// Put `leading` in front of the existing sources.
    pub fn prepend(&mut self, leading: &[String]) {
        if leading.is_empty() {
            return;
        }
        let mut paths = leading.to_vec();
        paths.extend(self.paths().into_iter().map(str::to_string));
        *self = EntrySources::Many(paths);
    }

    fn to_value(&self) -> ConfigValue {
        match self {
            EntrySources::Single(path) => ConfigValue::from(path.as_str()),
            EntrySources::Many(paths) => {
                ConfigValue::Array(paths.iter().map(|p| ConfigValue::from(p.as_str())).collect())
            }
        }
    }

    fn from_value(name: &str, value: &ConfigValue) -> Result<Self> {
        match value {
            ConfigValue::String(path) => Ok(EntrySources::Single(path.clone())),
            ConfigValue::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| ConfigError::InvalidValue {
                        field: format!("entry.{name}"),
                        hint: Some("entry sources must be strings".to_string()),
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(EntrySources::Many),
            _ => Err(ConfigError::InvalidValue {
                field: format!("entry.{name}"),
                hint: Some("expected a path or a list of paths".to_string()),
            }),
        }
    }
}

impl From<&str> for EntrySources {
    fn from(path: &str) -> Self {
        EntrySources::Single(path.to_string())
    }
}

/// Mapping from bundle name to its sources.
///
/// Equality ignores insertion order; iteration keeps it for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryMap(IndexMap<String, EntrySources>);

impl EntryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, sources: impl Into<EntrySources>) {
        self.0.insert(name.into(), sources.into());
    }

    pub fn get(&self, name: &str) -> Option<&EntrySources> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EntrySources)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut EntrySources)> {
        self.0.iter_mut()
    }

    pub fn to_value(&self) -> ConfigValue {
        let map: ConfigMap = self
            .0
            .iter()
            .map(|(name, sources)| (name.clone(), sources.to_value()))
            .collect();
        ConfigValue::Object(map)
    }

    /// Read an `entry` field in any of the shapes bundlers accept: a single
    /// path, a list of paths, or a name-to-sources table. `null` is empty.
    pub fn from_value(value: &ConfigValue) -> Result<Self> {
        let mut entry = EntryMap::new();
        match value {
            ConfigValue::Null => {}
            ConfigValue::String(_) | ConfigValue::Array(_) => {
                entry.insert(
                    DEFAULT_ENTRY_NAME,
                    EntrySources::from_value(DEFAULT_ENTRY_NAME, value)?,
                );
            }
            ConfigValue::Object(map) => {
                for (name, sources) in map {
                    entry.insert(name.clone(), EntrySources::from_value(name, sources)?);
                }
            }
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "entry".to_string(),
                    hint: Some("expected a path, a list of paths or a table".to_string()),
                });
            }
        }
        Ok(entry)
    }
}

impl FromIterator<(String, EntrySources)> for EntryMap {
    fn from_iter<I: IntoIterator<Item = (String, EntrySources)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

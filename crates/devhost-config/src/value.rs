//! Bundler config tree.
//!
//! Every value that can appear in a bundler configuration belongs to a closed
//! set of kinds. The kind is decided once, when a value enters the tree (see
//! [`ConfigValue::from_json`]), so serialization never has to inspect types at
//! runtime:
//!
//! - plain data (`null`, booleans, numbers, strings, arrays, objects)
//! - [`Pattern`]: a regex-like value, serialized as its `/source/flags` text
//! - `Tagged`: a non-plain object such as a plugin instance, serialized as
//!   `{ "<TypeName>": { ...fields } }`
//!
//! In JSON or TOML documents the non-plain kinds are spelled with marker keys:
//!
//! ```toml
//! [module.rules.test]
//! "$pattern" = '\.jsx?$'
//! flags = "i"
//!
//! [[plugins]]
//! "$type" = "DefinePlugin"
//! definitions = { __DEV__ = true }
//! ```

use std::fmt;

use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Number, Value};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Marker key turning a table into a [`Pattern`].
pub const PATTERN_KEY: &str = "$pattern";

/// Marker key turning a table into a tagged (non-plain) object.
pub const TYPE_KEY: &str = "$type";

/// Ordered string-keyed table of config values.
pub type ConfigMap = IndexMap<String, ConfigValue>;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<ConfigValue>),
    Object(ConfigMap),
    Pattern(Pattern),
    Tagged { type_name: String, fields: ConfigMap },
}

impl ConfigValue {
    /// Convert a JSON document into a config tree, classifying marker tables.
    ///
    /// # Errors
    ///
    /// Fails when a marker table is malformed (empty or non-string `$type`,
    /// non-string `$pattern`, unknown pattern flag).
    pub fn from_json(value: Value) -> Result<Self> {
        Ok(match value {
            Value::Null => ConfigValue::Null,
            Value::Bool(b) => ConfigValue::Bool(b),
            Value::Number(n) => ConfigValue::Number(n),
            Value::String(s) => ConfigValue::String(s),
            Value::Array(items) => ConfigValue::Array(
                items
                    .into_iter()
                    .map(ConfigValue::from_json)
                    .collect::<Result<_>>()?,
            ),
            Value::Object(mut map) => {
                if let Some(source) = map.shift_remove(PATTERN_KEY) {
                    let Value::String(source) = source else {
                        return Err(ConfigError::InvalidValue {
                            field: PATTERN_KEY.to_string(),
                            hint: Some("pattern source must be a string".to_string()),
                        });
                    };
                    let flags = match map.shift_remove("flags") {
                        None | Some(Value::Null) => String::new(),
                        Some(Value::String(flags)) => flags,
                        Some(_) => {
                            return Err(ConfigError::InvalidValue {
                                field: "flags".to_string(),
                                hint: Some("pattern flags must be a string".to_string()),
                            });
                        }
                    };
                    return Ok(ConfigValue::Pattern(Pattern::new(&source, &flags)?));
                }

                let type_name = match map.shift_remove(TYPE_KEY) {
                    None => None,
                    Some(Value::String(name)) if !name.is_empty() => Some(name),
                    Some(_) => {
                        return Err(ConfigError::InvalidValue {
                            field: TYPE_KEY.to_string(),
                            hint: Some("type name must be a non-empty string".to_string()),
                        });
                    }
                };

                let mut fields = ConfigMap::with_capacity(map.len());
                for (key, value) in map {
                    fields.insert(key, ConfigValue::from_json(value)?);
                }

                match type_name {
                    Some(type_name) => ConfigValue::Tagged { type_name, fields },
                    None => ConfigValue::Object(fields),
                }
            }
        })
    }

    /// Empty object.
    pub fn object() -> Self {
        ConfigValue::Object(ConfigMap::new())
    }

    /// JavaScript-style truthiness: `null`, `false`, `0` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ConfigValue::Null => false,
            ConfigValue::Bool(b) => *b,
            ConfigValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            ConfigValue::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ConfigValue::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ConfigMap> {
        match self {
            ConfigValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key on an object; `None` for missing keys and non-objects.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Layer `overlay` on top of `self`.
    ///
    /// Objects merge key by key, recursively. Any other overlay value
    /// (arrays, patterns and tagged objects included) replaces what was there.
    pub fn merge(&mut self, overlay: &ConfigValue) {
        match (self, overlay) {
            (ConfigValue::Object(target), ConfigValue::Object(update)) => {
                for (key, value) in update {
                    target
                        .entry(key.clone())
                        .or_insert(ConfigValue::Null)
                        .merge(value);
                }
            }
            (slot, _) => *slot = overlay.clone(),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<u16> for ConfigValue {
    fn from(value: u16) -> Self {
        ConfigValue::Number(Number::from(value))
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(value: ConfigMap) -> Self {
        ConfigValue::Object(value)
    }
}

impl From<Pattern> for ConfigValue {
    fn from(value: Pattern) -> Self {
        ConfigValue::Pattern(value)
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ConfigValue::Null => serializer.serialize_unit(),
            ConfigValue::Bool(b) => serializer.serialize_bool(*b),
            ConfigValue::Number(n) => n.serialize(serializer),
            ConfigValue::String(s) => serializer.serialize_str(s),
            ConfigValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ConfigValue::Object(fields) => fields.serialize(serializer),
            ConfigValue::Pattern(pattern) => serializer.collect_str(pattern),
            ConfigValue::Tagged { type_name, fields } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(&format!("<{type_name}>"), fields)?;
                map.end()
            }
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::String(s) => f.write_str(s),
            other => match serde_json::to_string(other) {
                Ok(text) => f.write_str(&text),
                Err(_) => f.write_str("<unprintable>"),
            },
        }
    }
}

/// Regex-like config value.
///
/// Source and flags are kept exactly as written; they are what the bundler
/// receives. Flags follow the JavaScript spelling. The source is also
/// compiled for local matching when the `regex` engine understands it;
/// JavaScript-only syntax such as lookaround or backreferences is carried
/// through uncompiled.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    flags: String,
    compiled: Option<Regex>,
}

impl Pattern {
    /// # Errors
    ///
    /// [`ConfigError::InvalidPattern`] for a flag JavaScript does not know.
    pub fn new(source: &str, flags: &str) -> Result<Self> {
        let mut builder = RegexBuilder::new(source);
        for flag in flags.chars() {
            match flag {
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'd' | 'g' | 'u' | 'v' | 'y' => {}
                other => {
                    return Err(ConfigError::InvalidPattern {
                        source_text: source.to_string(),
                        message: format!("unknown flag '{other}'"),
                    });
                }
            }
        }

        let compiled = match builder.build() {
            Ok(regex) => Some(regex),
            Err(err) => {
                debug!(source, "pattern kept uncompiled: {}", err);
                None
            }
        };

        Ok(Self {
            source: source.to_string(),
            flags: flags.to_string(),
            compiled,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    /// Match `text` locally; `None` when the source could not be compiled.
    pub fn is_match(&self, text: &str) -> Option<bool> {
        self.compiled.as_ref().map(|regex| regex.is_match(text))
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source() && self.flags == other.flags
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self.source();
        if source.is_empty() {
            return write!(f, "/(?:)/{}", self.flags);
        }

        f.write_str("/")?;
        let mut escaped = false;
        for ch in source.chars() {
            if ch == '/' && !escaped {
                f.write_str("\\/")?;
            } else {
                write!(f, "{ch}")?;
            }
            escaped = ch == '\\' && !escaped;
        }
        write!(f, "/{}", self.flags)
    }
}

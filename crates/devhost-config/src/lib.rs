//! Bundler configuration model for devhost.
//!
//! - [`value`]: the config tree and its serialization rules
//! - [`entry`]: entry maps
//! - [`resolved`]: the invariant-checked config handed to a bundler
//! - [`loader`]: built-in target defaults and custom config files
//! - [`settings`]: application settings (figment-backed)

pub mod entry;
pub mod error;
pub mod loader;
pub mod resolved;
pub mod settings;
pub mod value;

pub use entry::{EntryMap, EntrySources};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, ConfigSource, FileConfigLoader, LoadArgs};
pub use resolved::{
    ConfigWarning, DEFAULT_PUBLIC_PATH, DevServerConfig, OutputConfig, ResolvedConfig,
};
pub use settings::{
    AppSettings, BundlerSettings, CustomSettings, DEFAULT_PORT, DevServerOptions, Target,
};
pub use value::{ConfigMap, ConfigValue, Pattern};

//! Config resolver.
//!
//! Layers, in order (later wins):
//!
//! 1. built-in default for the target
//! 2. discovered entries (seeded with the resolved port)
//! 3. the user's custom config, extending the previous layer
//! 4. dev-server invariants ([`ResolvedConfig::enforce`])
//!
//! Resolution never mutates the caller's options; the chosen port comes back
//! in [`Resolved::port`].

use devhost_config::{
    BundlerSettings, ConfigLoader, ConfigSource, ConfigWarning, DEFAULT_PORT, FileConfigLoader,
    LoadArgs, ResolvedConfig, Target,
};
use tracing::{debug, warn};

use crate::context::AppContext;
use crate::discovery::{EntryDiscovery, PageEntryLoader};
use crate::error::Result;
use crate::port::{DEFAULT_PORT_ATTEMPTS, PortLease, resolve_port};

/// Output of a resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub config: ResolvedConfig,
    pub port: PortLease,
    /// Everything that was corrected along the way (already logged)
    pub warnings: Vec<ConfigWarning>,
}

pub struct ConfigResolver {
    loader: Box<dyn ConfigLoader>,
    discovery: Box<dyn EntryDiscovery>,
    port_attempts: u16,
}

impl ConfigResolver {
    /// Resolver with the stock file loader and page entry discovery.
    pub fn new(ctx: &AppContext) -> Self {
        Self {
            loader: Box::new(FileConfigLoader::new(&ctx.base_dir)),
            discovery: Box::new(PageEntryLoader::default()),
            port_attempts: DEFAULT_PORT_ATTEMPTS,
        }
    }

    pub fn with_loader(mut self, loader: impl ConfigLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_discovery(mut self, discovery: impl EntryDiscovery + 'static) -> Self {
        self.discovery = Box::new(discovery);
        self
    }

    pub fn with_port_attempts(mut self, attempts: u16) -> Self {
        self.port_attempts = attempts;
        self
    }

    /// Resolve the bundler config for `target`.
    ///
    /// # Errors
    ///
    /// Base or custom config that cannot be loaded, an invalid config shape,
    /// or no free port.
    pub fn resolve(
        &self,
        ctx: &AppContext,
        options: &BundlerSettings,
        target: Target,
    ) -> Result<Resolved> {
        let is_dev = ctx.is_dev();
        let mut warnings = Vec::new();

        let preferred = options.dev_server.port.unwrap_or(DEFAULT_PORT);
        let port = resolve_port(preferred, self.port_attempts)?;
        if port.is_fallback() {
            let warning = ConfigWarning::PortFallback {
                requested: port.requested,
                actual: port.actual,
            };
            warn!(requested = port.requested, actual = port.actual, "{}", warning);
            warnings.push(warning);
        }

        let mut dev_server = options.dev_server.clone();
        dev_server.port = Some(port.actual);
        let entry = self.discovery.discover(ctx, &dev_server, is_dev)?;
        debug!(?entry, "entries auto loaded");

        let mut tree = self.loader.load(
            &ConfigSource::Builtin(target),
            LoadArgs::Base {
                entry: &entry,
                is_dev,
            },
        )?;

        let (custom_path, deprecation) = options.custom_config_path();
        if let Some(warning) = deprecation {
            warn!("{}", warning);
            warnings.push(warning);
        }
        if let Some(path) = custom_path {
            debug!(path = %path.display(), "custom config found");
            let source = ConfigSource::File(path.to_path_buf());
            tree = self.loader.load(
                &source,
                LoadArgs::Custom {
                    seed: &tree,
                    is_dev,
                    target,
                },
            )?;
        }

        let (config, enforced) = ResolvedConfig::enforce(tree, port.actual)?;
        for warning in &enforced {
            warn!("{}", warning);
        }
        warnings.extend(enforced);

        Ok(Resolved {
            config,
            port,
            warnings,
        })
    }
}

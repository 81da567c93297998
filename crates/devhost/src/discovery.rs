//! Entry discovery.
//!
//! The resolver asks an [`EntryDiscovery`] for the entry map before loading
//! the base config. [`PageEntryLoader`] is the stock implementation: every
//! directory under `client/` holding an `index.*` file is a page bundle.

use std::path::{Path, PathBuf};

use devhost_config::{DEFAULT_PORT, DevServerOptions, EntryMap, EntrySources};
use tracing::debug;
use walkdir::WalkDir;

use crate::context::AppContext;
use crate::error::{DevError, Result};

const INDEX_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];

/// Produces the entry map for a project.
pub trait EntryDiscovery: Send + Sync {
    fn discover(&self, ctx: &AppContext, dev_server: &DevServerOptions, is_dev: bool)
    -> Result<EntryMap>;
}

/// Scans `<base_dir>/<client_dir>` for page entries.
///
/// `client/index.jsx` becomes bundle `index`, `client/home/index.jsx` becomes
/// bundle `home`. In development with `hot` on, each bundle is prefixed with
/// the live-reload client pointing at the dev server.
#[derive(Debug, Clone)]
pub struct PageEntryLoader {
    client_dir: PathBuf,
}

impl Default for PageEntryLoader {
    fn default() -> Self {
        Self {
            client_dir: PathBuf::from("client"),
        }
    }
}

impl PageEntryLoader {
    pub fn new(client_dir: impl Into<PathBuf>) -> Self {
        Self {
            client_dir: client_dir.into(),
        }
    }
}

impl EntryDiscovery for PageEntryLoader {
    fn discover(
        &self,
        ctx: &AppContext,
        dev_server: &DevServerOptions,
        is_dev: bool,
    ) -> Result<EntryMap> {
        let root = ctx.base_dir.join(&self.client_dir);
        let mut entry = EntryMap::new();
        if !root.is_dir() {
            debug!(dir = %root.display(), "no client directory, no entries discovered");
            return Ok(entry);
        }

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .max_depth(2)
            .sort_by_file_name();

        for item in walker {
            let item = item.map_err(|e| DevError::Io(e.into()))?;
            let path = item.path();
            if !item.file_type().is_file() || !is_index_file(path) {
                continue;
            }

            let name = if item.depth() == 1 {
                "index".to_string()
            } else {
                match path.parent().and_then(Path::file_name) {
                    Some(dir) => dir.to_string_lossy().into_owned(),
                    None => continue,
                }
            };
            if entry.get(&name).is_some() {
                continue;
            }

            let rel = path.strip_prefix(&ctx.base_dir).unwrap_or(path);
            entry.insert(name, EntrySources::Single(rel.to_string_lossy().into_owned()));
        }

        if is_dev && dev_server.hot {
            let port = dev_server.port.unwrap_or(DEFAULT_PORT);
            let client = vec![
                format!("webpack-dev-server/client?http://{}:{}", dev_server.host, port),
                "webpack/hot/only-dev-server".to_string(),
            ];
            for (_, sources) in entry.iter_mut() {
                sources.prepend(&client);
            }
        }

        debug!(count = entry.len(), "entries discovered");
        Ok(entry)
    }
}

fn is_index_file(path: &Path) -> bool {
    path.file_stem().is_some_and(|stem| stem == "index")
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| INDEX_EXTENSIONS.contains(&ext))
}

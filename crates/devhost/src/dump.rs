//! Config dumper.
//!
//! Writes the resolved config to `<rundir>/webpack.<env>.json` for
//! inspection. Purely diagnostic: every failure is logged and swallowed.

use std::path::PathBuf;

use devhost_config::ResolvedConfig;
use tracing::{debug, warn};

use crate::error::Result;

/// Runtime facts of the process owning the dev server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeState {
    pub rundir: PathBuf,
    pub env: String,
}

impl RuntimeState {
    pub fn dump_path(&self) -> PathBuf {
        self.rundir.join(format!("webpack.{}.json", self.env))
    }
}

/// Dump `config` under the run directory; never fails.
pub fn dump_config(runtime: &RuntimeState, config: &ResolvedConfig) {
    match write_dump(runtime, config) {
        Ok(path) => debug!(path = %path.display(), "config dumped"),
        Err(err) => warn!("dumpConfig error: {}", err),
    }
}

fn write_dump(runtime: &RuntimeState, config: &ResolvedConfig) -> Result<PathBuf> {
    if !runtime.rundir.exists() {
        std::fs::create_dir_all(&runtime.rundir)?;
    }
    let path = runtime.dump_path();
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

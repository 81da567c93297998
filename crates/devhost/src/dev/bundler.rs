//! Seam to the module bundler.
//!
//! The bundler and its live server are black boxes: devhost hands over a
//! resolved config and gets back a stream of compilation results plus a
//! server it can bind and stop.

use std::net::SocketAddr;

use async_trait::async_trait;
use devhost_config::ResolvedConfig;
use tokio::sync::mpsc;

use crate::error::Result;

/// Outcome of one (re)compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CompilationResult {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn failed(errors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            errors: errors.into_iter().map(Into::into).collect(),
            warnings: Vec::new(),
        }
    }

    /// All clear: no errors (warnings allowed).
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A dev server created by the bundler, not yet bound.
#[async_trait]
pub trait LiveServer: Send + Sync {
    async fn listen(&self, addr: SocketAddr) -> std::io::Result<()>;

    /// Stop serving; returns once the socket is released.
    async fn close(&self);
}

/// What the bundler hands back for one server instance.
pub struct BundlerSession {
    /// One item per finished compilation, initial build first
    pub compilations: mpsc::UnboundedReceiver<CompilationResult>,
    pub server: Box<dyn LiveServer>,
}

pub trait Bundler: Send + Sync {
    /// Create a compiler and dev server for `config`.
    fn serve(&self, config: &ResolvedConfig) -> Result<BundlerSession>;
}

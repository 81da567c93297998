//! Development server lifecycle.
//!
//! - [`bundler`]: the black-box bundler seam
//! - [`manager`]: start/close/restart against a caller-owned [`ServerSlot`]

pub mod bundler;
pub mod manager;

pub use bundler::{Bundler, BundlerSession, CompilationResult, LiveServer};
pub use manager::{CompileStatus, DevServerManager, ServerSlot, SharedStatus};

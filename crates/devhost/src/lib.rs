//! devhost - dev-server orchestration between a host application and a
//! module bundler.
//!
//! The host process resolves a bundler config, starts the bundler's dev
//! server inside a worker, and needs to know which port it ended up on.
//! devhost covers that path:
//!
//! - [`port`] - free-port search from a preferred port
//! - [`resolve`] - built-in defaults + discovered entries + custom config,
//!   with dev-server invariants enforced
//! - [`dump`] - diagnostic dump of the resolved config
//! - [`dev`] - start/close/restart of the live server
//! - [`ipc`] - the ready/port messages exchanged with the parent process
//! - [`ui`] - entry announcement and status lines
//!
//! The bundler itself is a black box behind [`dev::Bundler`].
//!
//! # Example
//!
//! ```rust,no_run
//! use devhost::{context::AppContext, resolve::ConfigResolver};
//! use devhost_config::Target;
//!
//! fn main() -> devhost::Result<()> {
//!     let ctx = AppContext::load(".", None)?;
//!     let resolved = ConfigResolver::new(&ctx).resolve(&ctx, &ctx.settings.bundler, Target::Browser)?;
//!     println!("dev server will use port {}", resolved.port.actual);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod context;
pub mod dev;
pub mod discovery;
pub mod dump;
pub mod error;
pub mod ipc;
pub mod logger;
pub mod port;
pub mod resolve;
pub mod ui;

pub use context::AppContext;
pub use dev::{DevServerManager, ServerSlot};
pub use error::{DevError, Result, ResultExt};
pub use ipc::{IpcMessage, ProcessChannel};
pub use resolve::{ConfigResolver, Resolved};

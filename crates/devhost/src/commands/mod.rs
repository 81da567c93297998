//! Command implementations for the devhost CLI.
//!
//! - [`config`] - Resolve and print the bundler config
//! - [`port`] - Find a free dev-server port

pub mod config;
pub mod port;

pub use config::execute as config_execute;
pub use port::execute as port_execute;

//! Command-line interface definition for devhost.
//!
//! # Command Structure
//!
//! - `devhost config` - Resolve the bundler config and print it as JSON
//! - `devhost port` - Find a free dev-server port

mod commands;
pub mod enums;
mod validation;

use clap::Parser;

pub use commands::{Command, ConfigArgs, PortArgs};
pub use enums::*;
pub use validation::parse_port;

/// devhost - dev-server orchestration for bundled web applications
#[derive(Parser, Debug)]
#[command(
    name = "devhost",
    version,
    about = "Dev-server orchestration for bundled web applications",
    long_about = "devhost resolves the bundler configuration for a host application:\n\
                  built-in target defaults, discovered page entries, the project's custom\n\
                  config, and a free dev-server port."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::cli::enums::*;
use crate::cli::validation::parse_port;

/// Available devhost subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the bundler config
    ///
    /// Layers the built-in target defaults, discovered page entries and the
    /// project's custom config, then prints the result as JSON and dumps it
    /// to `<rundir>/webpack.<env>.json`.
    Config(ConfigArgs),

    /// Find a free dev-server port
    ///
    /// Probes the preferred port and the ones after it; prints the first
    /// free one.
    Port(PortArgs),
}

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Build target whose defaults are used
    #[arg(short, long, value_enum, default_value = "browser")]
    pub target: TargetArg,

    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Preferred dev-server port, overrides bundler.dev_server.port
    #[arg(short, long, value_parser = parse_port)]
    pub port: Option<u16>,

    /// Custom config file (.toml or .json), overrides bundler.custom.config_path
    #[arg(long, value_name = "FILE")]
    pub custom: Option<PathBuf>,

    /// Do not write the diagnostic dump
    #[arg(long)]
    pub no_dump: bool,
}

/// Arguments for the port command
#[derive(Args, Debug)]
pub struct PortArgs {
    /// Port to try first
    #[arg(value_parser = parse_port, default_value = "6002")]
    pub preferred: u16,

    /// How many consecutive ports to probe
    #[arg(long, default_value_t = crate::port::DEFAULT_PORT_ATTEMPTS)]
    pub attempts: u16,
}

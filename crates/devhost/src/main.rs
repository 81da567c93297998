//! devhost CLI entry point.
//!
//! Parses arguments, sets up logging and colors, dispatches the command.

use clap::Parser;
use devhost::{cli, commands, error, logger, ui};
use miette::Result;

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    if args.no_color {
        ui::disable_colors();
    } else {
        ui::init_colors();
    }

    let result = match args.command {
        cli::Command::Config(config_args) => commands::config_execute(config_args),
        cli::Command::Port(port_args) => commands::port_execute(port_args),
    };

    result.map_err(error::to_miette)
}

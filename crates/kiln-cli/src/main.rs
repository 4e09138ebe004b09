//! kiln CLI entry point.
//!
//! Parses arguments, sets up colors and dispatches to the command
//! implementations. Logging is installed by each command once its
//! configuration (and so `settings.log_level`) is known.

use clap::Parser;
use kiln_cli::{cli, commands, error, ui};
use miette::Result;

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    ui::init_colors(args.global.no_color);

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args, &args.global),
        cli::Command::Check(check_args) => commands::check_execute(check_args, &args.global),
    };

    result.map_err(error::cli_error_to_miette)
}

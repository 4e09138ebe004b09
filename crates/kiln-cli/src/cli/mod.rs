//! Command-line interface definition.
//!
//! - `kiln build` - run the build pipeline
//! - `kiln check` - validate configuration without building

mod commands;

use clap::{Args, Parser};

pub use commands::{BuildArgs, CheckArgs, Command};

/// kiln - static-asset build pipeline
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "Build static web assets into chunked bundles",
    long_about = "kiln walks the module graph from a single script entry, transforms\n\
                  scripts, components, styles and assets, splits the result into\n\
                  chunks and writes them together with a generated HTML document."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

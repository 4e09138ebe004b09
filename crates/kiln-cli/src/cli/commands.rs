use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Available kiln subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the project into the output directory
    ///
    /// Cleans the output directory, walks the module graph from the entry,
    /// transforms every module, partitions the result into chunks and writes
    /// the chunks, assets and entry document.
    Build(BuildArgs),

    /// Validate configuration without building
    ///
    /// Checks the configuration schema and that the entry and template
    /// exist, then prints the role table and chunk rules.
    Check(CheckArgs),
}

/// Arguments for the build command
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Config file (defaults to kiln.toml or the `kiln` field of package.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Profile from the config file to apply
    #[arg(short, long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Output directory, relative to the project root
    #[arg(short = 'd', long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Script entry, relative to the project root
    #[arg(short, long, value_name = "FILE")]
    pub entry: Option<PathBuf>,

    /// Worker threads for the transform stage
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,
}

/// Arguments for the check command
#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Config file (defaults to kiln.toml or the `kiln` field of package.json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Profile from the config file to apply
    #[arg(short, long, value_name = "NAME")]
    pub profile: Option<String>,
}

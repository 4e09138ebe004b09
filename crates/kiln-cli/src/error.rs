//! Error handling for the kiln CLI.
//!
//! [`CliError`] wraps the library errors (`kiln_config::ConfigError`,
//! `kiln_bundler::Error`) and adds the failures only the command line can
//! produce: a missing `--config` file, an unknown `--profile`, a bad merge
//! of environment overrides. [`cli_error_to_miette`] turns any of them into
//! a report with a hint.

mod report;

use std::path::PathBuf;

use kiln_config::ConfigError;
use thiserror::Error;

pub use report::cli_error_to_miette;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] kiln_bundler::Error),

    /// `--config` points at nothing
    #[error("config file not found: {}", .0.display())]
    ConfigFileNotFound(PathBuf),

    #[error("profile '{name}' is not defined")]
    ProfileNotFound {
        name: String,
        /// Profiles the config does define, sorted
        available: Vec<String>,
    },

    /// Environment or command-line overrides did not fit the config shape
    #[error("failed to merge configuration overrides: {0}")]
    Layering(#[from] figment::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

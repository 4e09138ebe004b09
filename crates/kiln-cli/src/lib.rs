//! kiln CLI - build static-asset projects from the command line.
//!
//! The binary is a thin layer over `kiln-bundler`:
//!
//! - [`cli`] - argument definitions (`kiln build`, `kiln check`)
//! - [`config`] - layered configuration loading
//! - [`commands`] - command implementations
//! - [`error`] - CLI errors and their miette rendering
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status messages, spinner and the build summary table
//!
//! # Example
//!
//! ```rust,no_run
//! use kiln_cli::config::{ConfigArgs, Overrides, load};
//!
//! # fn main() -> kiln_cli::Result<()> {
//! let loaded = load(".".as_ref(), &ConfigArgs::default(), &Overrides::default())?;
//! println!("entry: {}", loaded.build.entry.display());
//! # Ok(()) }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, Result};

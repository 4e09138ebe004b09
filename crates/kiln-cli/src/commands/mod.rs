//! Command implementations.
//!
//! - [`build`] - run the build pipeline
//! - [`check`] - validate configuration

pub mod build;
pub mod check;
pub(crate) mod utils;

pub use build::execute as build_execute;
pub use check::execute as check_execute;

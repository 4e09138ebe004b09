//! Configuration for the kiln build pipeline.
//!
//! [`KilnConfig`] is the file-level document; [`BuildOptions`] carries every
//! knob of one build; [`PathRegistry`] turns the role table into absolute
//! directories.

pub mod build;
pub mod config;
pub mod discovery;
pub mod error;
pub mod paths;
pub mod settings;
pub mod validation;

// Re-export main types
pub use build::*;
pub use config::*;
pub use error::*;
pub use paths::{PathRegistry, PathRole, PathsConfig};
pub use settings::*;

// Re-export discovery and validation
pub use discovery::{ConfigDiscovery, load_file};
pub use validation::{ConfigValidator, FsValidator, SchemaValidator, validate_fs, validate_schema};

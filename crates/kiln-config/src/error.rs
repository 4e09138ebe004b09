//! Error types for configuration validation and loading.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    // Path registry errors
    #[error("unknown path role '{key}' (expected one of: src, build, public, static, icons, components)")]
    UnknownRole { key: String },

    #[error("path role '{role}' resolves outside the project root: {}", .path.display())]
    RoleOutsideProject { role: String, path: PathBuf },

    #[error("build directory {} overlaps the '{role}' directory", .path.display())]
    BuildDirOverlap { role: String, path: PathBuf },

    // Filesystem validation errors (for CLI use)
    #[error("entry path not found: {}", .path.display())]
    EntryNotFound { path: PathBuf },

    #[error("{field} not found: {}", .path.display())]
    FileNotFound { field: String, path: PathBuf },

    // Config parsing/loading errors
    #[error("config not found")]
    NotFound,

    #[error("invalid config value for '{field}'{}", .hint.as_ref().map(|h| format!(": {h}")).unwrap_or_default())]
    InvalidValue { field: String, hint: Option<String> },

    #[error("invalid profile override: {message}")]
    InvalidProfileOverride { message: String },

    // Schema validation errors (no filesystem checks)
    #[error("schema validation failed: {message}")]
    SchemaValidation {
        message: String,
        hint: Option<String>,
    },

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

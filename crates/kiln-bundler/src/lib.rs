#![cfg_attr(docsrs, feature(doc_cfg))]

//! # kiln-bundler
//!
//! The build half of kiln: per-kind transforms, chunk partitioning, the
//! entry document and the staged pipeline that ties them together.
//!
//! ```no_run
//! use kiln_bundler::{BuildOptions, Pipeline};
//!
//! # fn main() -> kiln_bundler::Result<()> {
//! let output = Pipeline::new(".", BuildOptions::default())?.run()?;
//! for chunk in output.chunks.iter() {
//!     println!("{} ({} modules)", chunk.name, chunk.modules.len());
//! }
//! # Ok(()) }
//! ```

use std::path::PathBuf;

pub use kiln_config::{BuildOptions, ConfigError, PathRegistry, PathRole};
pub use kiln_graph::{AssetKind, ModuleGraph, ModuleId};

pub mod chunks;
pub mod emit;
pub mod html;
pub mod lint;
pub mod output;
pub mod pipeline;
pub mod runtime;
pub mod sprite;
pub mod transform;

pub use chunks::{Chunk, ChunkKind, ChunkRule, ChunkSet, PartitionOptions, partition};
pub use emit::{EmissionTable, OutputFile, hash_content, render_filename};
pub use html::{EntryDocument, HtmlContext};
pub use lint::{LintFinding, LintKind, LintReport};
pub use pipeline::{BuildContext, BuildOutput, BuildState, Pipeline, Stage};
pub use sprite::{SpriteSymbol, SpriteTable};
pub use transform::{
    ComponentCompiler, DefaultComponentCompiler, DefaultTranspiler, SyntaxError, TransformedUnit,
    Transforms, Transpiler,
};

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

/// Error types for kiln-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration could not be turned into a registry or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Classification, resolution or scanning failed.
    #[error(transparent)]
    Graph(#[from] kiln_graph::Error),

    /// Two icon files map to the same sprite symbol.
    #[error("duplicate sprite symbol '{id}': {} and {}", .first.display(), .second.display())]
    DuplicateSymbolId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("entry document template not found: {}", .path.display())]
    TemplateNotFound { path: PathBuf },

    /// A transform collaborator rejected its input.
    #[error("failed to transform {}: {message}", .path.display())]
    Transform { path: PathBuf, message: String },

    /// Two different sources claimed the same output filename.
    #[error("output conflict on '{filename}': {} and {} differ", .existing.display(), .incoming.display())]
    OutputConflict {
        filename: String,
        existing: PathBuf,
        incoming: PathBuf,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An emitted filename would land outside the output directory.
    #[error("invalid output path: {0}")]
    InvalidOutputPath(String),

    #[error("failed to render {}: {source}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },

    #[error("failed to serialize build manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Result type alias for kiln-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// The file the failure is about, when there is one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Error::Graph(err) => err.path(),
            Error::DuplicateSymbolId { second, .. } => Some(second),
            Error::TemplateNotFound { path }
            | Error::Transform { path, .. }
            | Error::Io { path, .. }
            | Error::Template { path, .. } => Some(path),
            Error::OutputConflict { incoming, .. } => Some(incoming),
            _ => None,
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Config(ConfigError::UnknownRole { .. }) => "kiln::unknown_role",
            Error::Config(ConfigError::RoleOutsideProject { .. }) => "kiln::role_outside_project",
            Error::Config(ConfigError::BuildDirOverlap { .. }) => "kiln::build_dir_overlap",
            Error::Config(_) => "kiln::config",
            Error::Graph(kiln_graph::Error::Resolve(_)) => "kiln::module_not_found",
            Error::Graph(_) => "kiln::graph",
            Error::DuplicateSymbolId { .. } => "kiln::duplicate_symbol_id",
            Error::TemplateNotFound { .. } => "kiln::template_not_found",
            Error::Transform { .. } => "kiln::transform",
            Error::OutputConflict { .. } => "kiln::output_conflict",
            Error::Io { .. } => "kiln::io",
            Error::InvalidConfig(_) => "kiln::invalid_config",
            Error::InvalidOutputPath(_) => "kiln::invalid_output_path",
            Error::Template { .. } => "kiln::template",
            Error::Manifest(_) => "kiln::manifest",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Config(ConfigError::UnknownRole { .. }) => Some(Box::new(
                "Valid roles are src, build, public, static, icons and components.",
            )),
            Error::Config(ConfigError::BuildDirOverlap { .. }) => Some(Box::new(
                "The build directory is emptied before every build. Point paths.build at a directory of its own, such as dist.",
            )),
            Error::Graph(kiln_graph::Error::Resolve(kiln_graph::ResolveError::ModuleNotFound {
                searched,
                ..
            })) => Some(Box::new(format!(
                "Tried:\n{}\nCheck the specifier, the alias table and resolve.extensions.",
                searched
                    .iter()
                    .map(|p| format!("  {}", p.display()))
                    .collect::<Vec<_>>()
                    .join("\n")
            ))),
            Error::DuplicateSymbolId { id, .. } => Some(Box::new(format!(
                "Icon symbols are keyed by file name. Rename one of the files so '{id}' is unique."
            ))),
            Error::TemplateNotFound { .. } => Some(Box::new(
                "Set build.template to an existing HTML file (default public/index.html).",
            )),
            Error::OutputConflict { .. } => Some(Box::new(
                "Add [hash] to the output filename template or rename one of the sources.",
            )),
            Error::InvalidOutputPath(_) => Some(Box::new(
                "Output filename templates must stay inside the build directory.",
            )),
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check your kiln.toml for mistakes.\nError: {msg}"
            ))),
            _ => None,
        }
    }
}

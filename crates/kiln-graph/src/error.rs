use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a specifier into a file.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot resolve '{specifier}' from '{}' (searched {} location(s))", .from.display(), .searched.len())]
    ModuleNotFound {
        specifier: String,
        from: PathBuf,
        searched: Vec<PathBuf>,
    },

    #[error("'{specifier}' from '{}' resolves outside the project: {}", .from.display(), .path.display())]
    OutsideProject {
        specifier: String,
        from: PathBuf,
        path: PathBuf,
    },
}

/// Structural problems found while splitting a component file.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("unclosed <{tag}> block starting at byte {position}")]
    UnclosedBlock { tag: &'static str, position: usize },

    #[error("more than one <{tag}> block")]
    DuplicateBlock { tag: &'static str },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to scan '{}': {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: ScanError,
    },

    #[error("failed to walk '{}': {source}", .path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("entry '{}' is outside the project root", .path.display())]
    EntryOutsideProject { path: PathBuf },
}

impl Error {
    /// Path of the asset the error is about.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Error::Resolve(ResolveError::ModuleNotFound { from, .. })
            | Error::Resolve(ResolveError::OutsideProject { from, .. }) => Some(from),
            Error::Read { path, .. }
            | Error::Scan { path, .. }
            | Error::Walk { path, .. }
            | Error::EntryOutsideProject { path } => Some(path),
            Error::Pattern(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

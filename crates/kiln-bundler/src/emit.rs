//! Content-addressed emission.
//!
//! Every file the build produces goes through an [`EmissionTable`] first.
//! Nothing touches the disk here; the emit stage writes the table out.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use indexmap::IndexMap;
use parking_lot::Mutex;
use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

static HASH_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(?:content)?hash(?::(\d+))?\]").expect("hash placeholder pattern"));

/// Hex SHA-256 of `bytes`.
pub fn hash_content(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Fill an output filename template.
///
/// Placeholders: `[name]`, `[ext]` (with its leading dot), `[hash]` (first
/// `hash_length` hex digits of the content hash) and `[hash:N]`.
pub fn render_filename(
    template: &str,
    name: &str,
    ext: &str,
    contents: &[u8],
    hash_length: usize,
) -> String {
    let with_hash = if HASH_PLACEHOLDER.is_match(template) {
        let hash = hash_content(contents);
        HASH_PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| {
                let len = caps
                    .get(1)
                    .and_then(|m| m.as_str().parse::<usize>().ok())
                    .unwrap_or(hash_length)
                    .min(hash.len());
                hash[..len].to_string()
            })
            .into_owned()
    } else {
        template.to_string()
    };

    with_hash.replace("[name]", name).replace("[ext]", ext)
}

/// Extension of `path` with its leading dot, or an empty string.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}

/// A file waiting to be written, relative to the output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub filename: String,
    pub contents: Vec<u8>,
    /// The source that produced the file
    pub source: PathBuf,
}

impl OutputFile {
    pub fn new(filename: impl Into<String>, contents: impl Into<Vec<u8>>, source: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            contents: contents.into(),
            source: source.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.contents.len()
    }
}

/// Filename → file, shared by the parallel transform workers.
#[derive(Debug, Default)]
pub struct EmissionTable {
    files: Mutex<IndexMap<String, OutputFile>>,
}

impl EmissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `file.filename`.
    ///
    /// Returns `false` when the same bytes were already emitted under that
    /// name.
    ///
    /// # Errors
    ///
    /// [`Error::OutputConflict`] when a different source already claimed
    /// the name with different bytes. The existing entry is kept.
    pub fn emit(&self, file: OutputFile) -> Result<bool> {
        let mut files = self.files.lock();
        if let Some(existing) = files.get(&file.filename) {
            if existing.contents == file.contents {
                tracing::debug!(filename = %file.filename, "identical output deduplicated");
                return Ok(false);
            }
            return Err(Error::OutputConflict {
                filename: file.filename,
                existing: existing.source.clone(),
                incoming: file.source,
            });
        }
        tracing::debug!(filename = %file.filename, bytes = file.size(), "emitted");
        files.insert(file.filename.clone(), file);
        Ok(true)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.files.lock().contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }

    /// All files, sorted by filename so runs are reproducible regardless of
    /// worker scheduling.
    pub fn into_files(self) -> Vec<OutputFile> {
        sorted(self.files.into_inner())
    }

    /// Drain the table, leaving it empty. Same order as [`Self::into_files`].
    pub fn take(&self) -> Vec<OutputFile> {
        sorted(std::mem::take(&mut *self.files.lock()))
    }
}

fn sorted(files: IndexMap<String, OutputFile>) -> Vec<OutputFile> {
    let mut files: Vec<OutputFile> = files.into_values().collect();
    files.sort_by(|a, b| a.filename.cmp(&b.filename));
    files
}

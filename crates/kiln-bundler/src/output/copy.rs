use std::path::{Component, Path};

use walkdir::WalkDir;

use super::writer::StagingArea;
use crate::{Error, Result};

/// Files never copied from the static directory.
const IGNORED: &[&str] = &[".DS_Store"];

/// Mirror `source` into `prefix/` of the staged output.
///
/// A missing source directory copies nothing. Returns the output filenames
/// in path order; a file identical to one the build already staged under the
/// same name is skipped.
///
/// # Errors
///
/// [`Error::OutputConflict`] when a static file would replace different
/// bytes the build staged under the same name.
pub fn copy_static(source: &Path, prefix: &str, staging: &mut StagingArea) -> Result<Vec<String>> {
    if !source.is_dir() {
        tracing::debug!(dir = %source.display(), "no static directory, skipping copy");
        return Ok(Vec::new());
    }

    let mut copied = Vec::new();
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            let io = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            Error::io(path, io)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if IGNORED.contains(&name.as_ref()) {
            continue;
        }

        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let filename = output_name(prefix, relative);
        if staging.copy(&filename, entry.path())? {
            copied.push(filename);
        }
    }

    tracing::debug!(files = copied.len(), "static files copied");
    Ok(copied)
}

fn output_name(prefix: &str, relative: &Path) -> String {
    let parts = relative.components().filter_map(|c| match c {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        _ => None,
    });
    let prefix = prefix.trim_matches('/');
    std::iter::once(prefix.to_string())
        .filter(|p| !p.is_empty())
        .chain(parts)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn mirrors_tree_and_skips_ds_store() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("static");
        fs::create_dir_all(source.join("docs")).unwrap();
        fs::write(source.join("robots.txt"), "ok").unwrap();
        fs::write(source.join("docs/guide.pdf"), "pdf").unwrap();
        fs::write(source.join(".DS_Store"), "junk").unwrap();
        fs::write(source.join("docs/.DS_Store"), "junk").unwrap();

        let mut staging = StagingArea::new(&dir.path().join("dist")).unwrap();
        let copied = copy_static(&source, "static", &mut staging).unwrap();
        assert_eq!(copied, ["static/docs/guide.pdf", "static/robots.txt"]);
        assert!(staging.path().join("static/robots.txt").is_file());
        assert!(!staging.path().join("static/.DS_Store").exists());
    }

    #[test]
    fn missing_source_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let mut staging = StagingArea::new(&dir.path().join("dist")).unwrap();
        let copied = copy_static(&dir.path().join("nope"), "static", &mut staging).unwrap();
        assert!(copied.is_empty());
    }

    #[test]
    fn empty_prefix_copies_to_root() {
        assert_eq!(output_name("", Path::new("a/b.txt")), "a/b.txt");
        assert_eq!(output_name("/static/", Path::new("b.txt")), "static/b.txt");
    }
}

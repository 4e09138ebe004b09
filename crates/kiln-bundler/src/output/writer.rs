//! Staged output writing.
//!
//! Every file of a build is first written into a staging directory created
//! next to the output directory. Only when all writes succeeded are the files
//! renamed into place; a failed build drops the staging directory and leaves
//! the output directory as the clean stage left it.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use path_clean::PathClean;
use tempfile::TempDir;

use crate::{Error, Result};

/// Normalize an output directory to an absolute, cleaned path.
pub fn normalize_dir(dir: &Path) -> Result<PathBuf> {
    let cleaned = dir.clean();
    if cleaned.is_absolute() {
        return Ok(cleaned);
    }
    let cwd = std::env::current_dir().map_err(|e| {
        Error::InvalidOutputPath(format!("failed to get current directory: {e}"))
    })?;
    Ok(cwd.join(cleaned).clean())
}

/// Join `filename` onto `base_dir`, rejecting anything that escapes it.
///
/// Catches `../../etc/passwd`, absolute paths and traversal hidden in the
/// middle of a path such as `img/../../x`.
pub fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.is_empty() {
        return Err(Error::InvalidOutputPath("empty filename".to_string()));
    }
    if filename.contains('\0') {
        return Err(Error::InvalidOutputPath(
            "filename contains null byte".to_string(),
        ));
    }

    #[cfg(target_os = "windows")]
    {
        let upper = filename.to_uppercase();
        let device_names = [
            "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
            "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
        ];
        for device in &device_names {
            if upper == *device || upper.starts_with(&format!("{device}.")) {
                return Err(Error::InvalidOutputPath(format!(
                    "filename is a reserved device name: {filename}"
                )));
            }
        }
    }

    let full_path = base_dir.join(Path::new(filename).clean()).clean();
    if !full_path.starts_with(base_dir) || full_path == base_dir {
        return Err(Error::InvalidOutputPath(format!(
            "'{}' escapes output directory '{}' (resolved to '{}')",
            filename,
            base_dir.display(),
            full_path.display()
        )));
    }
    Ok(full_path)
}

/// Remove everything inside `dir`, creating it when missing.
///
/// Returns the number of entries removed.
pub fn clean_dir(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| Error::io(&path, e))?;
        removed += 1;
    }
    Ok(removed)
}

/// A build's worth of files, written to a scratch directory until promoted.
///
/// Each filename is claimed once. Staging the same name again with the same
/// bytes is a no-op; different bytes are an [`Error::OutputConflict`].
#[derive(Debug)]
pub struct StagingArea {
    staging: TempDir,
    target: PathBuf,
    /// Filename → the source that claimed it
    files: IndexMap<String, PathBuf>,
}

impl StagingArea {
    /// Stage writes for `target`. The staging directory is a sibling of
    /// `target` so promotion is a same-filesystem rename.
    pub fn new(target: &Path) -> Result<Self> {
        let target = normalize_dir(target)?;
        let parent = target
            .parent()
            .ok_or_else(|| Error::InvalidOutputPath(format!("'{}' has no parent", target.display())))?;
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        let staging = tempfile::Builder::new()
            .prefix(".kiln-staging-")
            .tempdir_in(parent)
            .map_err(|e| Error::io(parent, e))?;
        Ok(Self {
            staging,
            target,
            files: IndexMap::new(),
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn path(&self) -> &Path {
        self.staging.path()
    }

    /// Filenames staged so far, in write order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Stage `contents` under `filename` on behalf of `source`.
    ///
    /// Returns `false` when identical bytes were already staged under that
    /// name.
    pub fn write(&mut self, filename: &str, contents: &[u8], source: &Path) -> Result<bool> {
        if self.already_staged(filename, contents, source)? {
            return Ok(false);
        }
        let path = self.prepare(filename)?;
        fs::write(&path, contents).map_err(|e| Error::io(&path, e))?;
        self.files.insert(filename.to_string(), source.to_path_buf());
        Ok(true)
    }

    /// Stage a copy of `source` under `filename`. Same return value as
    /// [`Self::write`].
    pub fn copy(&mut self, filename: &str, source: &Path) -> Result<bool> {
        if self.files.contains_key(filename) {
            let contents = fs::read(source).map_err(|e| Error::io(source, e))?;
            return self.write(filename, &contents, source);
        }
        let path = self.prepare(filename)?;
        fs::copy(source, &path).map_err(|e| Error::io(source, e))?;
        self.files.insert(filename.to_string(), source.to_path_buf());
        Ok(true)
    }

    fn already_staged(&self, filename: &str, contents: &[u8], source: &Path) -> Result<bool> {
        let Some(existing) = self.files.get(filename) else {
            return Ok(false);
        };
        let staged = self.staging.path().join(filename);
        let bytes = fs::read(&staged).map_err(|e| Error::io(&staged, e))?;
        if bytes == contents {
            tracing::debug!(filename, "identical staged output deduplicated");
            return Ok(true);
        }
        Err(Error::OutputConflict {
            filename: filename.to_string(),
            existing: existing.clone(),
            incoming: source.to_path_buf(),
        })
    }

    fn prepare(&self, filename: &str) -> Result<PathBuf> {
        let path = validate_output_path(self.staging.path(), filename)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        Ok(path)
    }

    /// Move every staged file into the target directory.
    ///
    /// Files already moved are removed again when a rename fails, so the
    /// target never holds part of a build.
    pub fn promote(self) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.target).map_err(|e| Error::io(&self.target, e))?;

        let mut promoted: Vec<PathBuf> = Vec::with_capacity(self.files.len());
        for filename in self.files.keys() {
            let from = self.staging.path().join(filename);
            let result = validate_output_path(&self.target, filename).and_then(|to| {
                if let Some(parent) = to.parent() {
                    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
                }
                fs::rename(&from, &to).map_err(|e| Error::io(&to, e))?;
                Ok(to)
            });
            match result {
                Ok(to) => promoted.push(to),
                Err(err) => {
                    rollback(&promoted);
                    return Err(err);
                }
            }
        }
        tracing::debug!(
            files = promoted.len(),
            target = %self.target.display(),
            "staged output promoted"
        );
        Ok(promoted)
    }
}

fn rollback(promoted: &[PathBuf]) {
    for path in promoted {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), "failed to roll back output file: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_stay_inside() {
        let base = Path::new("/out");
        assert_eq!(
            validate_output_path(base, "img/logo.png").unwrap(),
            PathBuf::from("/out/img/logo.png")
        );
        assert_eq!(
            validate_output_path(base, "./a/../b.js").unwrap(),
            PathBuf::from("/out/b.js")
        );
        for bad in ["../x.js", "img/../../x.js", "/etc/passwd", "", "a\0b", "."] {
            assert!(
                matches!(validate_output_path(base, bad), Err(Error::InvalidOutputPath(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn clean_removes_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.bundle.js"), "x").unwrap();
        fs::create_dir_all(dir.path().join("img/nested")).unwrap();
        fs::write(dir.path().join("img/nested/a.png"), "x").unwrap();

        assert_eq!(clean_dir(dir.path()).unwrap(), 2);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn clean_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dist");
        assert_eq!(clean_dir(&out).unwrap(), 0);
        assert!(out.is_dir());
    }

    #[test]
    fn nothing_lands_before_promotion() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dist");

        let mut staging = StagingArea::new(&out).unwrap();
        let src = Path::new("src/logo.png");
        staging.write("index.html", b"<html></html>", src).unwrap();
        staging.write("img/logo.1234.png", b"png", src).unwrap();
        assert_eq!(staging.files().collect::<Vec<_>>(), ["index.html", "img/logo.1234.png"]);
        assert!(!out.join("index.html").exists());
        assert!(staging.path().join("img/logo.1234.png").is_file());

        let staged_at = staging.path().to_path_buf();
        let written = staging.promote().unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(fs::read(out.join("img/logo.1234.png")).unwrap(), b"png");
        assert!(!staged_at.exists());
    }

    #[test]
    fn dropped_staging_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dist");
        {
            let mut staging = StagingArea::new(&out).unwrap();
            let src = Path::new("src/main.js");
            staging.write("main.bundle.js", b"x", src).unwrap();
            assert!(matches!(
                staging.write("../escape.js", b"x", src),
                Err(Error::InvalidOutputPath(_))
            ));
        }
        assert!(!out.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn restaging_a_name_dedupes_or_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let copy_source = dir.path().join("robots.txt");
        fs::write(&copy_source, "allow").unwrap();

        let mut staging = StagingArea::new(&dir.path().join("dist")).unwrap();
        assert!(staging.write("robots.txt", b"allow", Path::new("a")).unwrap());
        assert!(!staging.copy("robots.txt", &copy_source).unwrap());

        let err = staging
            .write("robots.txt", b"deny", Path::new("b"))
            .unwrap_err();
        assert!(
            matches!(&err, Error::OutputConflict { filename, existing, .. }
                if filename == "robots.txt" && existing == Path::new("a")),
            "{err}"
        );
        assert_eq!(fs::read(staging.path().join("robots.txt")).unwrap(), b"allow");
        assert_eq!(staging.files().count(), 1);
    }
}

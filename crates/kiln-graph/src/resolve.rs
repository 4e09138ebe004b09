//! Module resolution.
//!
//! Turns an import specifier written in one file into the concrete file it
//! names. Order of attempts:
//!
//! 1. relative specifiers (`./`, `../`) against the importing file's directory
//! 2. alias tokens (longest first) against the alias's role directory
//! 3. each search root in declared order
//!
//! For every candidate base path the exact file is tried first, then the
//! configured extensions in order, then (dependency root only) the package's
//! `module`/`main` field, then `index` plus each extension.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_config::{PathRegistry, PathRole, ResolveOptions, SearchRoot};
use path_clean::PathClean;
use serde::Serialize;

use crate::asset::AssetReference;
use crate::classify::Classifier;
use crate::error::ResolveError;

/// Package fields consulted for a directory under the dependency root.
const PACKAGE_FIELDS: &[&str] = &["module", "main"];

/// How a search step chose its base path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "via", rename_all = "snake_case")]
pub enum Strategy {
    Relative,
    Alias { token: String, role: PathRole },
    Root { root: String },
}

/// One base path tried during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchStep {
    #[serde(flatten)]
    pub strategy: Strategy,
    pub base: PathBuf,
}

/// Which candidate form matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Matched {
    Exact,
    Extension(String),
    PackageField(String),
    Index(String),
}

/// A specifier bound to a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedModule {
    pub specifier: String,
    pub asset: AssetReference,
    /// Steps tried, in order; the last one produced the match
    pub trail: Vec<SearchStep>,
    pub matched: Matched,
}

impl ResolvedModule {
    pub fn path(&self) -> &Path {
        &self.asset.path
    }
}

#[derive(Debug, Clone)]
pub struct ModuleResolver {
    registry: Arc<PathRegistry>,
    classifier: Arc<Classifier>,
    /// Sorted longest token first
    aliases: Vec<(String, PathRole)>,
    roots: Vec<SearchRoot>,
    extensions: Vec<String>,
}

impl ModuleResolver {
    pub fn new(
        registry: Arc<PathRegistry>,
        classifier: Arc<Classifier>,
        options: &ResolveOptions,
    ) -> Self {
        let mut aliases: Vec<(String, PathRole)> = options
            .aliases
            .iter()
            .map(|(token, role)| (token.clone(), *role))
            .collect();
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        Self {
            registry,
            classifier,
            aliases,
            roots: options.roots.clone(),
            extensions: options.extensions.clone(),
        }
    }

    pub fn registry(&self) -> &Arc<PathRegistry> {
        &self.registry
    }

    pub fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    /// Whether `specifier` starts with a registered alias token.
    pub fn is_aliased(&self, specifier: &str) -> bool {
        self.match_alias(specifier).is_some()
    }

    /// Resolve `specifier` as written in `from`.
    ///
    /// Pure function of the filesystem state, the registry and the options.
    pub fn resolve(&self, from: &Path, specifier: &str) -> Result<ResolvedModule, ResolveError> {
        let mut trail = Vec::new();

        if is_relative(specifier) {
            let dir = from.parent().unwrap_or(self.registry.root());
            let base = dir.join(specifier).clean();
            if !self.registry.is_within_project(&base) {
                return Err(ResolveError::OutsideProject {
                    specifier: specifier.to_string(),
                    from: from.to_path_buf(),
                    path: base,
                });
            }
            let package_dir = self.registry.is_dependency(&base);
            return self.attempt(from, specifier, Strategy::Relative, base, package_dir, trail);
        }

        if let Some((token, role, rest)) = self.match_alias(specifier) {
            let dir = self.registry.resolve(role);
            let base = dir.join(rest).clean();
            if !base.starts_with(dir) {
                return Err(ResolveError::OutsideProject {
                    specifier: specifier.to_string(),
                    from: from.to_path_buf(),
                    path: base,
                });
            }
            let strategy = Strategy::Alias {
                token: token.to_string(),
                role,
            };
            return self.attempt(from, specifier, strategy, base, false, trail);
        }

        for root in &self.roots {
            let (dir, package_dir) = match root {
                SearchRoot::Role(role) => (self.registry.resolve(*role), false),
                SearchRoot::Dependencies => (self.registry.dependency_root(), true),
            };
            let base = dir.join(specifier.trim_start_matches('/')).clean();
            if !base.starts_with(dir) {
                continue;
            }
            let step = SearchStep {
                strategy: Strategy::Root {
                    root: root.to_string(),
                },
                base: base.clone(),
            };
            trail.push(step);
            if let Some(matched) = self.probe(&base, package_dir) {
                return Ok(self.finish(specifier, matched, trail));
            }
        }

        Err(self.not_found(from, specifier, trail))
    }

    fn attempt(
        &self,
        from: &Path,
        specifier: &str,
        strategy: Strategy,
        base: PathBuf,
        package_dir: bool,
        mut trail: Vec<SearchStep>,
    ) -> Result<ResolvedModule, ResolveError> {
        trail.push(SearchStep {
            strategy,
            base: base.clone(),
        });
        match self.probe(&base, package_dir) {
            Some(matched) => Ok(self.finish(specifier, matched, trail)),
            None => Err(self.not_found(from, specifier, trail)),
        }
    }

    fn finish(
        &self,
        specifier: &str,
        (path, matched): (PathBuf, Matched),
        trail: Vec<SearchStep>,
    ) -> ResolvedModule {
        tracing::debug!(specifier, path = %path.display(), "resolved");
        ResolvedModule {
            specifier: specifier.to_string(),
            asset: self.classifier.reference(path),
            trail,
            matched,
        }
    }

    fn not_found(&self, from: &Path, specifier: &str, trail: Vec<SearchStep>) -> ResolveError {
        ResolveError::ModuleNotFound {
            specifier: specifier.to_string(),
            from: from.to_path_buf(),
            searched: trail.into_iter().map(|step| step.base).collect(),
        }
    }

    fn match_alias<'s>(&self, specifier: &'s str) -> Option<(&str, PathRole, &'s str)> {
        self.aliases.iter().find_map(|(token, role)| {
            let rest = specifier.strip_prefix(token.as_str())?;
            if rest.is_empty() {
                Some((token.as_str(), *role, rest))
            } else {
                rest.strip_prefix('/').map(|rest| (token.as_str(), *role, rest))
            }
        })
    }

    /// Candidate forms for one base path.
    fn probe(&self, base: &Path, package_dir: bool) -> Option<(PathBuf, Matched)> {
        if base.is_file() {
            return Some((base.to_path_buf(), Matched::Exact));
        }

        if let Some(found) = self.with_extensions(base) {
            return Some(found);
        }

        if package_dir && base.is_dir() {
            if let Some(found) = self.package_entry(base) {
                return Some(found);
            }
        }

        self.index_of(base)
    }

    fn with_extensions(&self, base: &Path) -> Option<(PathBuf, Matched)> {
        self.extensions.iter().find_map(|ext| {
            let candidate = append_extension(base, ext);
            candidate
                .is_file()
                .then(|| (candidate, Matched::Extension(ext.clone())))
        })
    }

    fn index_of(&self, dir: &Path) -> Option<(PathBuf, Matched)> {
        if !dir.is_dir() {
            return None;
        }
        self.extensions.iter().find_map(|ext| {
            let candidate = dir.join(format!("index{ext}"));
            candidate
                .is_file()
                .then(|| (candidate, Matched::Index(ext.clone())))
        })
    }

    fn package_entry(&self, dir: &Path) -> Option<(PathBuf, Matched)> {
        let manifest = fs::read_to_string(dir.join("package.json")).ok()?;
        let manifest: serde_json::Value = serde_json::from_str(&manifest).ok()?;

        PACKAGE_FIELDS.iter().find_map(|field| {
            let target = manifest.get(*field)?.as_str()?;
            let base = dir.join(target).clean();
            if !base.starts_with(dir) {
                return None;
            }
            let path = if base.is_file() {
                base
            } else {
                self.with_extensions(&base)
                    .or_else(|| self.index_of(&base))?
                    .0
            };
            Some((path, Matched::PackageField((*field).to_string())))
        })
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

fn append_extension(base: &Path, ext: &str) -> PathBuf {
    let mut raw: OsString = base.as_os_str().to_owned();
    raw.push(ext);
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_detection() {
        assert!(is_relative("./a"));
        assert!(is_relative("../a"));
        assert!(is_relative(".."));
        assert!(!is_relative(".hidden"));
        assert!(!is_relative("lodash"));
        assert!(!is_relative("@/util"));
    }

    #[test]
    fn extension_is_appended_not_replaced() {
        assert_eq!(
            append_extension(Path::new("/p/src/a.min"), ".js"),
            PathBuf::from("/p/src/a.min.js")
        );
    }
}

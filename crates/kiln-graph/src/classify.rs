//! Asset classification.
//!
//! An ordered `(pattern, kind)` table decides what a file is. The first row
//! whose pattern matches the file name, and whose location constraint (if
//! any) holds, wins.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_config::{PathRegistry, PathRole};
use regex::Regex;
use walkdir::WalkDir;

use crate::asset::{AssetKind, AssetReference};
use crate::error::{Error, Result};

/// One row of the classification table.
#[derive(Debug, Clone)]
pub struct ClassRule {
    pub pattern: Regex,
    pub kind: AssetKind,
    /// Only files under this role directory match
    pub within: Option<PathRole>,
}

impl ClassRule {
    pub fn new(pattern: &str, kind: AssetKind) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            kind,
            within: None,
        })
    }

    pub fn within(mut self, role: PathRole) -> Self {
        self.within = Some(role);
        self
    }
}

/// Default table, in evaluation order.
const DEFAULT_TABLE: &[(&str, AssetKind, Option<PathRole>)] = &[
    (r"(?i)\.vue$", AssetKind::Component, None),
    (r"(?i)\.(m?js|jsx|tsx?)$", AssetKind::Script, None),
    (r"(?i)\.(css|scss)$", AssetKind::Stylesheet, None),
    (r"(?i)\.(ico|gif|png|jpe?g|webp)$", AssetKind::RasterImage, None),
    (r"(?i)\.(woff2?|eot|ttf|otf)$", AssetKind::Font, None),
    (r"(?i)\.svg$", AssetKind::VectorIcon, Some(PathRole::Icons)),
];

#[derive(Debug, Clone)]
pub struct Classifier {
    registry: Arc<PathRegistry>,
    rules: Vec<ClassRule>,
}

impl Classifier {
    /// Classifier with the default table.
    pub fn new(registry: Arc<PathRegistry>) -> Result<Self> {
        let rules = DEFAULT_TABLE
            .iter()
            .map(|(pattern, kind, within)| {
                let rule = ClassRule::new(pattern, *kind)?;
                Ok(match within {
                    Some(role) => rule.within(*role),
                    None => rule,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_rules(registry, rules))
    }

    pub fn with_rules(registry: Arc<PathRegistry>, rules: Vec<ClassRule>) -> Self {
        Self { registry, rules }
    }

    pub fn registry(&self) -> &Arc<PathRegistry> {
        &self.registry
    }

    pub fn rules(&self) -> &[ClassRule] {
        &self.rules
    }

    /// Classify a file by name and location. Never touches the filesystem.
    pub fn classify(&self, path: &Path) -> AssetKind {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return AssetKind::Unclassified;
        };

        self.rules
            .iter()
            .find(|rule| {
                rule.pattern.is_match(name)
                    && rule
                        .within
                        .is_none_or(|role| self.registry.contains(role, path))
            })
            .map_or(AssetKind::Unclassified, |rule| rule.kind)
    }

    pub fn reference(&self, path: impl Into<PathBuf>) -> AssetReference {
        let path = path.into();
        let kind = self.classify(&path);
        AssetReference::new(path, kind)
    }

    /// Classify every file under `dir`, sorted by path.
    ///
    /// A missing directory yields an empty inventory. The dependency root is
    /// never descended into.
    pub fn inventory(&self, dir: &Path) -> Result<Vec<AssetReference>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let dependencies = self.registry.dependency_root();
        let mut refs = Vec::new();
        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.path() != dependencies);
        for entry in walker {
            let entry = entry.map_err(|source| Error::Walk {
                path: dir.to_path_buf(),
                source,
            })?;
            if entry.file_type().is_file() {
                refs.push(self.reference(entry.into_path()));
            }
        }
        Ok(refs)
    }

    /// Inventory of the icon directory.
    pub fn icons(&self) -> Result<Vec<AssetReference>> {
        let mut icons = self.inventory(self.registry.resolve(PathRole::Icons))?;
        icons.retain(|r| r.kind == AssetKind::VectorIcon);
        Ok(icons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_config::PathsConfig;

    fn classifier() -> Classifier {
        let registry = PathRegistry::new("/app", &PathsConfig::default()).unwrap();
        Classifier::new(Arc::new(registry)).unwrap()
    }

    #[test]
    fn table_order() {
        let c = classifier();
        assert_eq!(c.classify(Path::new("/app/src/App.vue")), AssetKind::Component);
        assert_eq!(c.classify(Path::new("/app/src/main.mjs")), AssetKind::Script);
        assert_eq!(c.classify(Path::new("/app/src/view.tsx")), AssetKind::Script);
        assert_eq!(c.classify(Path::new("/app/src/a.scss")), AssetKind::Stylesheet);
        assert_eq!(c.classify(Path::new("/app/src/logo.JPEG")), AssetKind::RasterImage);
        assert_eq!(c.classify(Path::new("/app/src/Inter.woff2")), AssetKind::Font);
        assert_eq!(c.classify(Path::new("/app/src/data.json")), AssetKind::Unclassified);
    }

    #[test]
    fn svg_is_location_qualified() {
        let c = classifier();
        assert_eq!(
            c.classify(Path::new("/app/src/icons/arrow.svg")),
            AssetKind::VectorIcon
        );
        assert_eq!(
            c.classify(Path::new("/app/src/icons/nav/arrow.svg")),
            AssetKind::VectorIcon
        );
        assert_eq!(
            c.classify(Path::new("/app/src/images/arrow.svg")),
            AssetKind::Unclassified
        );
    }

    #[test]
    fn empty_alternative_does_not_match_everything() {
        let c = classifier();
        assert_eq!(c.classify(Path::new("/app/src/readme.")), AssetKind::Unclassified);
        assert_eq!(c.classify(Path::new("/app/src/woff")), AssetKind::Unclassified);
    }

    #[test]
    fn custom_rules_replace_table() {
        let registry = Arc::new(PathRegistry::new("/app", &PathsConfig::default()).unwrap());
        let rules = vec![ClassRule::new(r"\.txt$", AssetKind::Script).unwrap()];
        let c = Classifier::with_rules(registry, rules);
        assert_eq!(c.classify(Path::new("/app/src/a.txt")), AssetKind::Script);
        assert_eq!(c.classify(Path::new("/app/src/a.js")), AssetKind::Unclassified);
    }
}

//! Role directories and the path registry.
//!
//! Every component of the pipeline locates its inputs and outputs through a
//! [`PathRegistry`]: a table from [`PathRole`] to one absolute directory,
//! composed once from the project root and never mutated afterwards.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use path_clean::PathClean;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Logical directory roles known to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathRole {
    /// Source root (scripts, components, styles)
    #[serde(rename = "src", alias = "source")]
    Source,
    /// Build output directory
    #[serde(rename = "build", alias = "dist")]
    Build,
    /// Public files (HTML template, favicon)
    #[serde(rename = "public")]
    Public,
    /// Static files copied verbatim into the output
    #[serde(rename = "static")]
    Static,
    /// Vector icons merged into the sprite
    #[serde(rename = "icons")]
    Icons,
    /// Component tree
    #[serde(rename = "components")]
    Components,
}

impl PathRole {
    /// All roles, in table order.
    pub const ALL: [PathRole; 6] = [
        PathRole::Source,
        PathRole::Build,
        PathRole::Public,
        PathRole::Static,
        PathRole::Icons,
        PathRole::Components,
    ];

    /// Canonical configuration key for this role.
    pub fn key(self) -> &'static str {
        match self {
            PathRole::Source => "src",
            PathRole::Build => "build",
            PathRole::Public => "public",
            PathRole::Static => "static",
            PathRole::Icons => "icons",
            PathRole::Components => "components",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PathRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PathRole {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "src" | "source" => Ok(PathRole::Source),
            "build" | "dist" => Ok(PathRole::Build),
            "public" => Ok(PathRole::Public),
            "static" => Ok(PathRole::Static),
            "icons" => Ok(PathRole::Icons),
            "components" => Ok(PathRole::Components),
            other => Err(ConfigError::UnknownRole {
                key: other.to_string(),
            }),
        }
    }
}

/// Project-relative directories for each role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub src: PathBuf,
    pub build: PathBuf,
    pub public: PathBuf,
    #[serde(rename = "static")]
    pub static_files: PathBuf,
    pub icons: PathBuf,
    pub components: PathBuf,
    /// Third-party dependency root searched after the source root
    pub dependencies: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src: PathBuf::from("src"),
            build: PathBuf::from("dist"),
            public: PathBuf::from("public"),
            static_files: PathBuf::from("static"),
            icons: PathBuf::from("src/icons"),
            components: PathBuf::from("src/components"),
            dependencies: PathBuf::from("node_modules"),
        }
    }
}

impl PathsConfig {
    fn get(&self, role: PathRole) -> &Path {
        match role {
            PathRole::Source => &self.src,
            PathRole::Build => &self.build,
            PathRole::Public => &self.public,
            PathRole::Static => &self.static_files,
            PathRole::Icons => &self.icons,
            PathRole::Components => &self.components,
        }
    }
}

/// Immutable role → directory table rooted at one project directory.
///
/// Resolution is string composition only; no directory is required to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRegistry {
    root: PathBuf,
    dirs: [PathBuf; 6],
    dependencies: PathBuf,
}

impl PathRegistry {
    /// Compose every role directory under `root`.
    ///
    /// A relative `root` is anchored at the current working directory.
    ///
    /// # Errors
    ///
    /// `RoleOutsideProject` when a configured directory is absolute or climbs
    /// out of the project root. `BuildDirOverlap` when the build directory is
    /// the root itself or nests with another role or the dependency root; the
    /// clean stage empties it.
    pub fn new(root: impl AsRef<Path>, config: &PathsConfig) -> Result<Self> {
        let root = root.as_ref();
        let root = if root.is_absolute() {
            root.clean()
        } else {
            std::env::current_dir()?.join(root).clean()
        };

        let mut dirs: [PathBuf; 6] = Default::default();
        for role in PathRole::ALL {
            dirs[role.index()] = compose(&root, role.key(), config.get(role))?;
        }
        let dependencies = compose(&root, "dependencies", &config.dependencies)?;
        check_build_dir(&root, &dirs, &dependencies)?;

        Ok(Self {
            root,
            dirs,
            dependencies,
        })
    }

    /// Project root every role is anchored at.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a role.
    pub fn resolve(&self, role: PathRole) -> &Path {
        &self.dirs[role.index()]
    }

    /// Directory for a role given by its configuration key.
    ///
    /// # Errors
    ///
    /// `UnknownRole` when `key` names no role.
    pub fn lookup(&self, key: &str) -> Result<&Path> {
        let role: PathRole = key.parse()?;
        Ok(self.resolve(role))
    }

    /// Third-party dependency root (`node_modules` by default).
    pub fn dependency_root(&self) -> &Path {
        &self.dependencies
    }

    /// Whether `path` lies under the directory of `role`.
    pub fn contains(&self, role: PathRole, path: &Path) -> bool {
        path.starts_with(self.resolve(role))
    }

    /// Whether `path` lies under the dependency root.
    pub fn is_dependency(&self, path: &Path) -> bool {
        path.starts_with(&self.dependencies)
    }

    /// Whether `path` lies inside the project tree.
    pub fn is_within_project(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }

    /// Project-relative form of `path`, `None` outside the project.
    pub fn relative(&self, path: &Path) -> Option<PathBuf> {
        path.strip_prefix(&self.root).ok().map(Path::to_path_buf)
    }

    /// Project-relative path with `/` separators, used as a stable module id.
    pub fn display_relative(&self, path: &Path) -> String {
        let rel = self.relative(path).unwrap_or_else(|| path.to_path_buf());
        rel.components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Resolve a project-relative file path (entry, template, favicon).
    ///
    /// # Errors
    ///
    /// `RoleOutsideProject` when the path is absolute outside the root or
    /// escapes it with `..`.
    pub fn project_file(&self, field: &str, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            let cleaned = path.clean();
            if cleaned.starts_with(&self.root) {
                return Ok(cleaned);
            }
            return Err(ConfigError::RoleOutsideProject {
                role: field.to_string(),
                path: cleaned,
            });
        }
        compose(&self.root, field, path)
    }
}

fn check_build_dir(root: &Path, dirs: &[PathBuf; 6], dependencies: &Path) -> Result<()> {
    let build = &dirs[PathRole::Build.index()];
    let overlap = |role: &str| ConfigError::BuildDirOverlap {
        role: role.to_string(),
        path: build.clone(),
    };

    if build == root {
        return Err(overlap("root"));
    }
    let others = PathRole::ALL
        .into_iter()
        .filter(|&role| role != PathRole::Build)
        .map(|role| (role.key(), dirs[role.index()].as_path()))
        .chain(std::iter::once(("dependencies", dependencies)));
    for (key, dir) in others {
        if build.starts_with(dir) || dir.starts_with(build) {
            return Err(overlap(key));
        }
    }
    Ok(())
}

fn compose(root: &Path, label: &str, rel: &Path) -> Result<PathBuf> {
    if rel.is_absolute() {
        return Err(ConfigError::RoleOutsideProject {
            role: label.to_string(),
            path: rel.to_path_buf(),
        });
    }

    let joined = root.join(rel).clean();
    if !joined.starts_with(root) {
        return Err(ConfigError::RoleOutsideProject {
            role: label.to_string(),
            path: joined,
        });
    }

    Ok(joined)
}

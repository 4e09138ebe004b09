use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;
use crate::paths::PathRole;

/// Module resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Alias token → role directory (e.g. `"@" → src`)
    pub aliases: IndexMap<String, PathRole>,

    /// Bare-specifier search roots, in order
    pub roots: Vec<SearchRoot>,

    /// Extensions tried after the exact file, in order
    pub extensions: Vec<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        let mut aliases = IndexMap::new();
        aliases.insert("@".to_string(), PathRole::Source);

        Self {
            aliases,
            roots: vec![SearchRoot::Role(PathRole::Source), SearchRoot::Dependencies],
            extensions: [".js", ".jsx", ".json", ".ts", ".tsx", ".vue", ".css", ".scss"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// A directory searched for bare specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchRoot {
    /// One of the role directories
    Role(PathRole),
    /// The third-party dependency root
    Dependencies,
}

impl fmt::Display for SearchRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchRoot::Role(role) => write!(f, "{role}"),
            SearchRoot::Dependencies => f.write_str("dependencies"),
        }
    }
}

impl FromStr for SearchRoot {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dependencies" | "node_modules" => Ok(SearchRoot::Dependencies),
            other => other.parse().map(SearchRoot::Role),
        }
    }
}

impl Serialize for SearchRoot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SearchRoot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

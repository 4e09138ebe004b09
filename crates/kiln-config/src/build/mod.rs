//! Build configuration types shared across kiln crates.

mod assets;
mod chunks;
mod helpers;
mod output;
mod resolve;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

pub use assets::{CssOptions, FontOptions, IconOptions, LintOptions};
pub use chunks::{ChunkOptions, ChunkRuleConfig, ChunkScope, ChunkTest};
pub use output::OutputOptions;
pub use resolve::{ResolveOptions, SearchRoot};

use crate::error::ConfigError;
use crate::paths::PathsConfig;
use helpers::{default_entry, default_lang, default_template, default_title};

/// Main build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Single script entry, project-relative
    #[serde(default = "default_entry")]
    pub entry: PathBuf,

    /// HTML template, project-relative
    #[serde(default = "default_template")]
    pub template: PathBuf,

    /// Favicon copied to the output root and linked from the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<PathBuf>,

    /// Document title
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_lang")]
    pub lang: String,

    /// Role directories
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub resolve: ResolveOptions,

    #[serde(default)]
    pub chunks: ChunkOptions,

    #[serde(default)]
    pub output: OutputOptions,

    #[serde(default)]
    pub fonts: FontOptions,

    #[serde(default)]
    pub icons: IconOptions,

    #[serde(default)]
    pub css: CssOptions,

    /// Free identifier → module specifier that supplies it
    ///
    /// A script that mentions `process` without importing it gains an
    /// implicit edge to `process/browser`.
    #[serde(default = "default_provide")]
    pub provide: IndexMap<String, String>,

    #[serde(default)]
    pub lint: LintOptions,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            template: default_template(),
            favicon: None,
            title: default_title(),
            lang: default_lang(),
            paths: PathsConfig::default(),
            resolve: ResolveOptions::default(),
            chunks: ChunkOptions::default(),
            output: OutputOptions::default(),
            fonts: FontOptions::default(),
            icons: IconOptions::default(),
            css: CssOptions::default(),
            provide: default_provide(),
            lint: LintOptions::default(),
        }
    }
}

fn default_provide() -> IndexMap<String, String> {
    let mut provide = IndexMap::new();
    provide.insert("process".to_string(), "process/browser".to_string());
    provide
}

impl BuildOptions {
    /// Create from serde_json::Value (for programmatic config)
    ///
    /// # Example
    ///
    /// ```
    /// use kiln_config::BuildOptions;
    /// use serde_json::json;
    /// use std::path::PathBuf;
    ///
    /// let value = json!({
    ///     "entry": "src/app.js",
    ///     "title": "Docs"
    /// });
    ///
    /// let options = BuildOptions::from_value(value).unwrap();
    /// assert_eq!(options.entry, PathBuf::from("src/app.js"));
    /// assert_eq!(options.output.filename, "[name].bundle.js");
    /// ```
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidValue {
            field: "build".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Convert to serde_json::Value
    pub fn to_value(&self) -> Result<Value, ConfigError> {
        serde_json::to_value(self).map_err(|e| ConfigError::InvalidValue {
            field: "build".to_string(),
            hint: Some(e.to_string()),
        })
    }

    /// Register an alias token pointing at a role directory.
    ///
    /// ```
    /// use kiln_config::{BuildOptions, PathRole};
    ///
    /// let options = BuildOptions::default().with_alias("~c", PathRole::Components);
    /// assert_eq!(options.resolve.aliases.get("~c"), Some(&PathRole::Components));
    /// ```
    pub fn with_alias(mut self, token: impl Into<String>, role: crate::paths::PathRole) -> Self {
        self.resolve.aliases.insert(token.into(), role);
        self
    }

    /// Chunk rules in evaluation order: descending priority, declaration
    /// order on ties.
    pub fn rules_in_evaluation_order(&self) -> Vec<&ChunkRuleConfig> {
        let mut rules: Vec<&ChunkRuleConfig> = self.chunks.rules.iter().collect();
        // sort_by is stable
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        rules
    }
}

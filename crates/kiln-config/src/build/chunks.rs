use serde::{Deserialize, Serialize};

use super::helpers::{default_min_chunks, default_true};
use crate::paths::PathRole;

/// Chunk splitting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkOptions {
    /// Grouping rules, evaluated by descending priority
    #[serde(default = "default_rules")]
    pub rules: Vec<ChunkRuleConfig>,

    /// Split the bootstrap into its own `runtime` chunk
    #[serde(default = "default_true")]
    pub runtime_chunk: bool,

    /// Dynamic imports start their own chunk
    #[serde(default = "default_true")]
    pub lazy_chunks: bool,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            rules: default_rules(),
            runtime_chunk: true,
            lazy_chunks: true,
        }
    }
}

/// One declarative grouping rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRuleConfig {
    pub name: String,

    pub test: ChunkTest,

    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub scope: ChunkScope,

    /// Minimum number of distinct referrers before the rule may claim a module
    #[serde(default = "default_min_chunks")]
    pub min_chunks: usize,
}

/// Predicate part of a chunk rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkTest {
    /// Module lives under the dependency root
    Dependencies,
    /// Module lives under a role directory
    Role(PathRole),
    /// Pattern over the project-relative path (`/` separated)
    Regex(String),
}

/// Which modules a rule may claim, by how they are reached from the entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkScope {
    /// Reachable through static imports from the entry
    Initial,
    /// Reachable only through a dynamic import
    Async,
    #[default]
    All,
}

fn default_rules() -> Vec<ChunkRuleConfig> {
    vec![
        ChunkRuleConfig {
            name: "libs".to_string(),
            test: ChunkTest::Dependencies,
            priority: 10,
            scope: ChunkScope::Initial,
            min_chunks: 1,
        },
        ChunkRuleConfig {
            name: "commons".to_string(),
            test: ChunkTest::Role(PathRole::Components),
            priority: 5,
            scope: ChunkScope::All,
            min_chunks: 3,
        },
    ]
}

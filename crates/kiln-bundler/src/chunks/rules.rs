use std::path::PathBuf;

use kiln_config::{ChunkRuleConfig, ChunkScope, ChunkTest, PathRegistry};
use kiln_graph::Module;
use regex::Regex;

use super::ChunkKind;
use crate::{Error, Result};

/// Compiled form of a rule's test.
#[derive(Debug, Clone)]
pub enum RuleTest {
    /// Module lives under the dependency root
    Dependencies,
    /// Module lives under a role directory
    Under(PathBuf),
    /// Pattern over the project-relative module id
    Pattern(Regex),
}

#[derive(Debug, Clone)]
pub struct ChunkRule {
    pub name: String,
    pub test: RuleTest,
    pub priority: i32,
    pub scope: ChunkScope,
    pub min_chunks: usize,
}

impl ChunkRule {
    pub fn compile(config: &ChunkRuleConfig, registry: &PathRegistry) -> Result<Self> {
        let test = match &config.test {
            ChunkTest::Dependencies => RuleTest::Dependencies,
            ChunkTest::Role(role) => RuleTest::Under(registry.resolve(*role).to_path_buf()),
            ChunkTest::Regex(pattern) => RuleTest::Pattern(Regex::new(pattern).map_err(|e| {
                Error::InvalidConfig(format!("chunk rule '{}': {e}", config.name))
            })?),
        };
        Ok(Self {
            name: config.name.clone(),
            test,
            priority: config.priority,
            scope: config.scope,
            min_chunks: config.min_chunks.max(1),
        })
    }

    /// Compile a rule table into evaluation order: descending priority,
    /// declaration order on ties.
    pub fn compile_all(configs: &[ChunkRuleConfig], registry: &PathRegistry) -> Result<Vec<Self>> {
        let mut rules = configs
            .iter()
            .map(|config| Self::compile(config, registry))
            .collect::<Result<Vec<_>>>()?;
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(rules)
    }

    /// Output chunk name: `libs` → `chunk-libs`.
    pub fn chunk_name(&self) -> String {
        format!("chunk-{}", self.name)
    }

    pub fn kind(&self) -> ChunkKind {
        match self.test {
            RuleTest::Dependencies => ChunkKind::Vendor,
            _ => ChunkKind::Shared,
        }
    }

    pub fn matches(&self, module: &Module) -> bool {
        match &self.test {
            RuleTest::Dependencies => module.is_dependency,
            RuleTest::Under(dir) => module.path.starts_with(dir),
            RuleTest::Pattern(re) => re.is_match(module.id.as_str()),
        }
    }

    /// Whether the rule's scope admits a module loaded eagerly
    /// (`initial`) or only through a dynamic import.
    pub fn in_scope(&self, initial: bool) -> bool {
        match self.scope {
            ChunkScope::Initial => initial,
            ChunkScope::Async => !initial,
            ChunkScope::All => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_config::{PathRole, PathsConfig};
    use kiln_graph::{AssetKind, ModuleId};

    fn registry() -> PathRegistry {
        PathRegistry::new("/project", &PathsConfig::default()).unwrap()
    }

    fn config(name: &str, test: ChunkTest, priority: i32) -> ChunkRuleConfig {
        ChunkRuleConfig {
            name: name.to_string(),
            test,
            priority,
            scope: ChunkScope::All,
            min_chunks: 1,
        }
    }

    #[test]
    fn compiles_each_test_form() {
        let registry = registry();
        let module = Module::new(
            ModuleId::from("src/components/Button.vue"),
            "/project/src/components/Button.vue",
            AssetKind::Component,
        );

        let role = ChunkRule::compile(&config("ui", ChunkTest::Role(PathRole::Components), 0), &registry).unwrap();
        assert!(role.matches(&module));
        assert_eq!(role.kind(), ChunkKind::Shared);

        let re = ChunkRule::compile(&config("vue", ChunkTest::Regex(r"\.vue$".into()), 0), &registry).unwrap();
        assert!(re.matches(&module));

        let deps = ChunkRule::compile(&config("libs", ChunkTest::Dependencies, 0), &registry).unwrap();
        assert!(!deps.matches(&module));
        assert!(deps.matches(&module.clone().dependency(true)));
        assert_eq!(deps.kind(), ChunkKind::Vendor);
        assert_eq!(deps.chunk_name(), "chunk-libs");
    }

    #[test]
    fn bad_pattern_is_invalid_config() {
        let err = ChunkRule::compile(&config("x", ChunkTest::Regex("(".into()), 0), &registry()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(msg) if msg.contains("'x'")));
    }

    #[test]
    fn evaluation_order() {
        let rules = ChunkRule::compile_all(
            &[
                config("low", ChunkTest::Dependencies, 1),
                config("high", ChunkTest::Dependencies, 9),
                config("tie", ChunkTest::Dependencies, 1),
            ],
            &registry(),
        )
        .unwrap();
        let names: Vec<_> = rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["high", "low", "tie"]);
    }

    #[test]
    fn scopes() {
        let mut rule = ChunkRule::compile(&config("x", ChunkTest::Dependencies, 0), &registry()).unwrap();
        assert!(rule.in_scope(true) && rule.in_scope(false));
        rule.scope = ChunkScope::Initial;
        assert!(rule.in_scope(true) && !rule.in_scope(false));
        rule.scope = ChunkScope::Async;
        assert!(!rule.in_scope(true) && rule.in_scope(false));
    }
}

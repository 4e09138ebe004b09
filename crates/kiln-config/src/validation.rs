//! Pluggable config validation strategies
//!
//! Separates filesystem validation (for CLI use) from schema validation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::build::{BuildOptions, ChunkTest};
use crate::error::{ConfigError, Result};
use crate::paths::PathRegistry;

/// Trait for pluggable config validation strategies
pub trait ConfigValidator {
    fn validate(&self, config: &BuildOptions) -> Result<()>;
}

/// Schema-only validation (no filesystem checks)
///
/// # Example
///
/// ```
/// use kiln_config::{BuildOptions, ConfigValidator, SchemaValidator};
///
/// SchemaValidator.validate(&BuildOptions::default()).unwrap();
/// ```
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, config: &BuildOptions) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in &config.chunks.rules {
            if rule.name.trim().is_empty() {
                return Err(ConfigError::SchemaValidation {
                    message: "chunk rule name cannot be empty".to_string(),
                    hint: Some("Give every entry in 'chunks.rules' a name".to_string()),
                });
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(ConfigError::SchemaValidation {
                    message: format!("duplicate chunk rule '{}'", rule.name),
                    hint: Some("Chunk rule names become chunk names and must be unique".to_string()),
                });
            }
            if rule.min_chunks == 0 {
                return Err(ConfigError::SchemaValidation {
                    message: format!("chunk rule '{}' has min_chunks = 0", rule.name),
                    hint: Some("Use min_chunks = 1 to claim every matching module".to_string()),
                });
            }
            if let ChunkTest::Regex(pattern) = &rule.test {
                Regex::new(pattern).map_err(|e| ConfigError::SchemaValidation {
                    message: format!("chunk rule '{}' has an invalid regex: {e}", rule.name),
                    hint: None,
                })?;
            }
        }

        for ext in &config.resolve.extensions {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(ConfigError::SchemaValidation {
                    message: format!("resolve extension '{ext}' must start with '.'"),
                    hint: Some("Write extensions like \".js\"".to_string()),
                });
            }
        }

        for token in config.resolve.aliases.keys() {
            if token.trim().is_empty() {
                return Err(ConfigError::SchemaValidation {
                    message: "alias token cannot be empty".to_string(),
                    hint: Some("Remove empty keys from 'resolve.aliases'".to_string()),
                });
            }
        }

        if config.resolve.roots.is_empty() {
            return Err(ConfigError::SchemaValidation {
                message: "at least one search root is required".to_string(),
                hint: Some("The default is [\"src\", \"dependencies\"]".to_string()),
            });
        }

        let output = &config.output;
        for (field, template) in [
            ("output.filename", &output.filename),
            ("output.css_filename", &output.css_filename),
            ("output.images", &output.images),
            ("output.fonts", &output.fonts),
            ("output.assets", &output.assets),
            ("icons.symbol_id", &config.icons.symbol_id),
        ] {
            if !template.contains("[name]") {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    hint: Some(format!("'{template}' must contain [name]")),
                });
            }
        }

        if output.hash_length == 0 || output.hash_length > 64 {
            return Err(ConfigError::InvalidValue {
                field: "output.hash_length".to_string(),
                hint: Some("Use a length between 1 and 64".to_string()),
            });
        }

        Ok(())
    }
}

/// Filesystem validator (for CLI use)
///
/// Runs schema validation, builds the [`PathRegistry`], then checks that the
/// entry, template and favicon are files inside the project root.
pub struct FsValidator {
    root: PathBuf,
}

impl FsValidator {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ConfigValidator for FsValidator {
    fn validate(&self, config: &BuildOptions) -> Result<()> {
        SchemaValidator.validate(config)?;
        let registry = PathRegistry::new(&self.root, &config.paths)?;

        let entry = registry.project_file("entry", &config.entry)?;
        if !entry.is_file() {
            return Err(ConfigError::EntryNotFound { path: entry });
        }

        let template = registry.project_file("template", &config.template)?;
        if !template.is_file() {
            return Err(ConfigError::FileNotFound {
                field: "template".to_string(),
                path: template,
            });
        }

        if let Some(favicon) = &config.favicon {
            let path = registry.project_file("favicon", favicon)?;
            if !path.is_file() {
                return Err(ConfigError::FileNotFound {
                    field: "favicon".to_string(),
                    path,
                });
            }
        }

        Ok(())
    }
}

/// Convenience function for schema-only validation
pub fn validate_schema(config: &BuildOptions) -> Result<()> {
    SchemaValidator.validate(config)
}

/// Convenience function for filesystem validation
pub fn validate_fs(config: &BuildOptions, root: impl AsRef<Path>) -> Result<()> {
    FsValidator::new(root).validate(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{ChunkRuleConfig, ChunkScope};

    fn rule(name: &str, test: ChunkTest) -> ChunkRuleConfig {
        ChunkRuleConfig {
            name: name.to_string(),
            test,
            priority: 0,
            scope: ChunkScope::All,
            min_chunks: 1,
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_schema(&BuildOptions::default()).is_ok());
    }

    #[test]
    fn rejects_duplicate_rule_names() {
        let mut config = BuildOptions::default();
        config.chunks.rules = vec![
            rule("libs", ChunkTest::Dependencies),
            rule("libs", ChunkTest::Dependencies),
        ];
        let err = validate_schema(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate chunk rule 'libs'"));
    }

    #[test]
    fn rejects_bad_regex() {
        let mut config = BuildOptions::default();
        config.chunks.rules = vec![rule("x", ChunkTest::Regex("(".into()))];
        assert!(matches!(
            validate_schema(&config),
            Err(ConfigError::SchemaValidation { .. })
        ));
    }

    #[test]
    fn rejects_zero_min_chunks() {
        let mut config = BuildOptions::default();
        config.chunks.rules[0].min_chunks = 0;
        assert!(validate_schema(&config).is_err());
    }

    #[test]
    fn rejects_extension_without_dot() {
        let mut config = BuildOptions::default();
        config.resolve.extensions.push("vue".into());
        assert!(validate_schema(&config).is_err());
    }

    #[test]
    fn rejects_template_without_name() {
        let mut config = BuildOptions::default();
        config.output.images = "img/[hash].png".into();
        let err = validate_schema(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "output.images"));
    }
}

use serde::{Deserialize, Serialize};

use super::helpers::{default_symbol_id, default_true};

/// Font handling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontOptions {
    /// Largest font (bytes) inlined as a data URI; unset inlines every font
    #[serde(default)]
    pub inline_limit: Option<u64>,
}

/// Icon sprite settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconOptions {
    /// Symbol id template, `[name]` is the icon file stem
    #[serde(default = "default_symbol_id")]
    pub symbol_id: String,
}

impl Default for IconOptions {
    fn default() -> Self {
        Self {
            symbol_id: default_symbol_id(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssOptions {
    /// Write stylesheets to `<chunk>.bundle.css` instead of injecting them
    #[serde(default)]
    pub extract: bool,
}

/// Advisory source checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintOptions {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for LintOptions {
    fn default() -> Self {
        Self { enabled: true }
    }
}

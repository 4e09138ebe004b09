//! Stylesheet rewriting.
//!
//! `url()` references to bundled assets are replaced by their public URLs
//! and `@import`s of bundled stylesheets are lifted out into module
//! requires, so imported rules load before the importing sheet.

use std::sync::LazyLock;

use kiln_graph::{Dependency, ModuleId, strip_comments};
use regex::{Captures, Regex};
use rustc_hash::FxHashMap;

static IMPORT_RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@import\s+(?:url\(\s*)?["']?([^"')\s;]+)["']?\s*\)?[^;{}]*;?"#)
        .expect("import rule pattern")
});

static URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*["']?([^"')\s]+)["']?\s*\)"#).expect("url pattern")
});

/// A stylesheet with bundled references resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewrittenStyle {
    pub css: String,
    /// Stylesheets pulled in by `@import`, in order
    pub imports: Vec<ModuleId>,
}

fn reference_key(raw: &str) -> &str {
    raw.split(['?', '#']).next().unwrap_or(raw)
}

/// Rewrite `css` using the edges the walker recorded for its module and the
/// public URLs of already transformed assets.
pub fn rewrite_stylesheet(
    css: &str,
    dependencies: &[Dependency],
    urls: &FxHashMap<ModuleId, String>,
) -> RewrittenStyle {
    let target = |raw: &str| {
        let key = reference_key(raw);
        dependencies
            .iter()
            .find(|d| d.specifier == key)
            .map(|d| d.target.clone())
    };

    // comments are dropped from the output; offsets line up with `css`
    let code = strip_comments(css, false);
    let mut imports = Vec::new();

    let without_imports = IMPORT_RULE.replace_all(&code, |caps: &Captures<'_>| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        match caps.get(1).and_then(|m| target(m.as_str())) {
            Some(id) => {
                if !imports.contains(&id) {
                    imports.push(id);
                }
                String::new()
            }
            None => whole.to_string(),
        }
    });

    let rewritten = URL.replace_all(&without_imports, |caps: &Captures<'_>| {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        let url = caps
            .get(1)
            .and_then(|m| target(m.as_str()))
            .and_then(|id| urls.get(&id));
        match url {
            Some(url) => format!("url(\"{url}\")"),
            None => whole.to_string(),
        }
    });

    RewrittenStyle {
        css: rewritten.trim().to_string(),
        imports,
    }
}

//! Single-file component compiling.

use std::path::Path;
use std::sync::LazyLock;

use kiln_graph::{ScanError, split_component, strip_comments};
use regex::Regex;

use super::link::js_string;
use super::script::SyntaxError;
use crate::emit::hash_content;

static EXPORT_DEFAULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bexport\s+default\b").expect("export default pattern"));

/// Binding the compiled component object is assigned to.
pub const COMPONENT_BINDING: &str = "__kiln_component__";

/// One `<style>` block after compiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStyle {
    pub css: String,
    pub scoped: bool,
}

/// A component turned into a plain script plus its styles.
///
/// `script` still uses module syntax; it goes through the transpiler next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledComponent {
    pub script: String,
    pub styles: Vec<CompiledStyle>,
    /// Attribute scoped styles are keyed to, when any style is scoped
    pub scope_id: Option<String>,
}

pub trait ComponentCompiler: Send + Sync {
    fn compile(&self, path: &Path, source: &str) -> Result<CompiledComponent, SyntaxError>;
}

/// Attaches the `<template>` markup to the script's default export as a
/// string and scopes `scoped` styles with a per-file attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultComponentCompiler;

impl ComponentCompiler for DefaultComponentCompiler {
    fn compile(&self, path: &Path, source: &str) -> Result<CompiledComponent, SyntaxError> {
        let parts = split_component(source).map_err(|err| scan_error(source, err))?;

        let scope_id = parts.styles.iter().any(|s| s.scoped).then(|| {
            let hash = hash_content(path.to_string_lossy().as_bytes());
            format!("data-v-{}", &hash[..8])
        });

        let mut script = match &parts.script {
            Some(block) => {
                let code = block.content;
                let stripped = strip_comments(code, true);
                match EXPORT_DEFAULT.find(&stripped) {
                    Some(m) => format!(
                        "{}const {COMPONENT_BINDING} ={}",
                        &code[..m.start()],
                        &code[m.end()..]
                    ),
                    None => format!("{code}\nconst {COMPONENT_BINDING} = {{}};"),
                }
            }
            None => format!("const {COMPONENT_BINDING} = {{}};"),
        };

        if !script.ends_with('\n') {
            script.push('\n');
        }
        if let Some(template) = &parts.template {
            script.push_str(&format!(
                "{COMPONENT_BINDING}.template = {};\n",
                js_string(template.content.trim())
            ));
        }
        if let Some(scope) = &scope_id {
            script.push_str(&format!("{COMPONENT_BINDING}.__scopeId = {};\n", js_string(scope)));
        }
        script.push_str(&format!("export default {COMPONENT_BINDING};\n"));

        let styles = parts
            .styles
            .iter()
            .map(|block| CompiledStyle {
                css: match (&scope_id, block.scoped) {
                    (Some(scope), true) => scope_css(block.content, scope),
                    _ => block.content.to_string(),
                },
                scoped: block.scoped,
            })
            .collect();

        Ok(CompiledComponent {
            script,
            styles,
            scope_id,
        })
    }
}

fn scan_error(source: &str, err: ScanError) -> SyntaxError {
    let offset = match &err {
        ScanError::UnclosedBlock { position, .. } => *position,
        ScanError::DuplicateBlock { .. } => 0,
    };
    let before = &source[..offset.min(source.len())];
    let line = before.matches('\n').count() + 1;
    let column = before.len() - before.rfind('\n').map_or(0, |i| i + 1) + 1;
    SyntaxError {
        message: err.to_string(),
        line,
        column,
    }
}

/// Append `[scope]` to every selector outside at-rule preludes and
/// keyframe blocks.
fn scope_css(css: &str, scope: &str) -> String {
    let code = strip_comments(css, false);
    let mut out = String::with_capacity(css.len() + 64);
    let mut last = 0;
    let mut depth = 0usize;
    // depth at which a @keyframes block opened
    let mut keyframes_at: Option<usize> = None;
    let mut prelude_start = 0;

    for (i, c) in code.char_indices() {
        match c {
            '{' => {
                let prelude = &css[prelude_start..i];
                let trimmed = prelude.trim();
                if trimmed.starts_with('@') {
                    if trimmed.contains("keyframes") {
                        keyframes_at = Some(depth);
                    }
                } else if keyframes_at.is_none() && !trimmed.is_empty() {
                    out.push_str(&css[last..prelude_start]);
                    let scoped: Vec<String> = prelude
                        .split(',')
                        .map(|sel| scope_selector(sel, scope))
                        .collect();
                    out.push_str(&scoped.join(","));
                    last = i;
                }
                depth += 1;
                prelude_start = i + 1;
            }
            '}' => {
                depth = depth.saturating_sub(1);
                if keyframes_at == Some(depth) {
                    keyframes_at = None;
                }
                prelude_start = i + 1;
            }
            ';' => prelude_start = i + 1,
            _ => {}
        }
    }
    out.push_str(&css[last..]);
    out
}

fn scope_selector(selector: &str, scope: &str) -> String {
    let trimmed = selector.trim_end();
    let trailing = &selector[trimmed.len()..];
    // pseudo-elements stay last
    match trimmed.find("::") {
        Some(pos) => format!("{}[{scope}]{}{trailing}", &trimmed[..pos], &trimmed[pos..]),
        None => format!("{trimmed}[{scope}]{trailing}"),
    }
}

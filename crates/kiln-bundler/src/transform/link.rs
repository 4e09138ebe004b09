//! Rewrites module syntax onto the runtime registry.
//!
//! ES `import`/`export` statements, `require()` and `import()` calls become
//! `__kiln_require__` calls against module ids. The scan runs on a copy with
//! comments blanked out, so commented-out imports stay untouched.

use std::ops::Range;
use std::sync::LazyLock;

use kiln_graph::{ModuleId, strip_comments};
use regex::Regex;
use rustc_hash::FxHashMap;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).expect($re));
    };
}

pattern!(
    IMPORT_FROM,
    r#"\b(import\s+([\w$*{},\s]+?)\s+from\s*["']([^"'\n]+)["'][ \t]*;?)"#
);
pattern!(IMPORT_BARE, r#"\b(import\s*["']([^"'\n]+)["'][ \t]*;?)"#);
pattern!(
    EXPORT_FROM,
    r#"\b(export\s+(\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s*["']([^"'\n]+)["'][ \t]*;?)"#
);
pattern!(EXPORT_LIST, r#"\b(export\s*\{([^}]*)\}[ \t]*;?)"#);
pattern!(
    EXPORT_DEFAULT_NAMED,
    r#"\b(export\s+default\s+)(?:async\s+)?(?:function\s*\*?\s*|class\s+)([\w$]+)"#
);
pattern!(EXPORT_DEFAULT, r#"\b(export\s+default\s+)"#);
pattern!(
    EXPORT_DECL,
    r#"\b(export\s+)(?:(?:async\s+)?function\s*\*?\s*([\w$]+)|class\s+([\w$]+)|(?:const|let|var)\s+([\w$]+))"#
);
pattern!(REQUIRE, r#"\brequire\s*\(\s*["']([^"'\n]+)["']\s*\)"#);
pattern!(DYNAMIC_IMPORT, r#"\bimport\s*\(\s*["']([^"'\n]+)["']\s*\)"#);

/// What the linker needs to know about one module.
#[derive(Debug, Clone, Default)]
pub struct LinkContext {
    /// Specifier as written → resolved module id
    pub specifiers: FxHashMap<String, ModuleId>,
    /// Free identifiers bound to modules (`process` → the polyfill)
    pub provided: Vec<(String, ModuleId)>,
}

impl LinkContext {
    fn target(&self, specifier: &str) -> String {
        match self.specifiers.get(specifier) {
            Some(id) => id.to_string(),
            None => {
                tracing::trace!(specifier, "specifier left as written");
                specifier.to_string()
            }
        }
    }

    fn require(&self, specifier: &str) -> String {
        format!("__kiln_require__({})", js_string(&self.target(specifier)))
    }
}

/// JSON-quoted string literal, valid as JavaScript.
pub fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

struct Edits {
    edits: Vec<(Range<usize>, String)>,
}

impl Edits {
    fn overlaps(&self, range: &Range<usize>) -> bool {
        self.edits
            .iter()
            .any(|(r, _)| r.start < range.end && range.start < r.end)
    }

    fn push(&mut self, range: Range<usize>, replacement: String) -> bool {
        if self.overlaps(&range) {
            return false;
        }
        self.edits.push((range, replacement));
        true
    }

    fn apply(mut self, source: &str) -> String {
        self.edits.sort_by_key(|(r, _)| r.start);
        let mut out = String::with_capacity(source.len());
        let mut last = 0;
        for (range, replacement) in self.edits {
            out.push_str(&source[last..range.start]);
            out.push_str(&replacement);
            last = range.end;
        }
        out.push_str(&source[last..]);
        out
    }
}

/// Link one script. Code without module syntax comes back unchanged apart
/// from `require` specifiers and provided bindings.
pub fn link(source: &str, ctx: &LinkContext) -> String {
    let code = strip_comments(source, true);
    let mut edits = Edits { edits: Vec::new() };
    let mut exports: Vec<(String, String)> = Vec::new();
    let mut esm = false;
    let mut temp = 0usize;

    for caps in EXPORT_FROM.captures_iter(&code) {
        let (Some(stmt), Some(clause), Some(spec)) = (caps.get(1), caps.get(2), caps.get(3)) else {
            continue;
        };
        let require = ctx.require(spec.as_str());
        let clause = clause.as_str().trim();
        let replacement = if let Some(rest) = clause.strip_prefix('*') {
            match rest.trim().strip_prefix("as") {
                Some(alias) => {
                    let var = format!("__kiln_x{temp}");
                    temp += 1;
                    exports.push((alias.trim().to_string(), var.clone()));
                    format!("const {var} = {require};")
                }
                None => format!("__kiln_require__.r(exports, {require});"),
            }
        } else {
            let var = format!("__kiln_x{temp}");
            temp += 1;
            for (local, exported) in specifier_list(clause) {
                exports.push((exported, format!("{var}.{local}")));
            }
            format!("const {var} = {require};")
        };
        esm |= edits.push(stmt.range(), replacement);
    }

    for caps in IMPORT_FROM.captures_iter(&code) {
        let (Some(stmt), Some(clause), Some(spec)) = (caps.get(1), caps.get(2), caps.get(3)) else {
            continue;
        };
        let replacement = import_bindings(clause.as_str(), &ctx.require(spec.as_str()), &mut temp);
        esm |= edits.push(stmt.range(), replacement);
    }

    for caps in IMPORT_BARE.captures_iter(&code) {
        let (Some(stmt), Some(spec)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        esm |= edits.push(stmt.range(), format!("{};", ctx.require(spec.as_str())));
    }

    for caps in EXPORT_LIST.captures_iter(&code) {
        let (Some(stmt), Some(list)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if edits.push(stmt.range(), String::new()) {
            esm = true;
            for (local, exported) in specifier_list(list.as_str()) {
                exports.push((exported, local));
            }
        }
    }

    for caps in EXPORT_DEFAULT_NAMED.captures_iter(&code) {
        let (Some(keyword), Some(name)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if edits.push(keyword.range(), String::new()) {
            esm = true;
            exports.push(("default".to_string(), name.as_str().to_string()));
        }
    }

    for caps in EXPORT_DEFAULT.captures_iter(&code) {
        let Some(keyword) = caps.get(1) else { continue };
        esm |= edits.push(keyword.range(), "exports.default = ".to_string());
    }

    for caps in EXPORT_DECL.captures_iter(&code) {
        let Some(keyword) = caps.get(1) else { continue };
        let Some(name) = caps.get(2).or(caps.get(3)).or(caps.get(4)) else {
            continue;
        };
        if edits.push(keyword.range(), String::new()) {
            esm = true;
            exports.push((name.as_str().to_string(), name.as_str().to_string()));
        }
    }

    for caps in REQUIRE.captures_iter(&code) {
        let (Some(call), Some(spec)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        edits.push(call.range(), ctx.require(spec.as_str()));
    }

    for caps in DYNAMIC_IMPORT.captures_iter(&code) {
        let (Some(call), Some(spec)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let target = js_string(&ctx.target(spec.as_str()));
        edits.push(call.range(), format!("__kiln_require__.l({target})"));
    }

    let body = edits.apply(source);

    let mut header = String::new();
    for (identifier, id) in &ctx.provided {
        header.push_str(&format!(
            "var {identifier} = __kiln_require__({});\n",
            js_string(id.as_str())
        ));
    }
    if esm {
        let getters: Vec<String> = exports
            .iter()
            .map(|(exported, local)| format!("{}: () => {local}", js_string(exported)))
            .collect();
        header.push_str(&format!("__kiln_require__.e(exports, {{ {} }});\n", getters.join(", ")));
    }

    if header.is_empty() {
        body
    } else {
        header + &body
    }
}

/// `a, b as c, default as d` → `(local, exported)` pairs.
fn specifier_list(list: &str) -> Vec<(String, String)> {
    list.trim()
        .trim_start_matches('{')
        .trim_end_matches('}')
        .split(',')
        .filter_map(|item| {
            let mut parts = item.split_whitespace();
            let local = parts.next()?;
            let exported = match (parts.next(), parts.next()) {
                (Some("as"), Some(alias)) => alias,
                _ => local,
            };
            Some((local.to_string(), exported.to_string()))
        })
        .collect()
}

/// Local bindings for an import clause such as `React, { useState as s }`
/// or `* as ns`.
fn import_bindings(clause: &str, require: &str, temp: &mut usize) -> String {
    let clause = clause.trim();
    let (head, named) = match clause.find('{') {
        Some(open) => (&clause[..open], Some(&clause[open..])),
        None => (clause, None),
    };

    let mut default = None;
    let mut namespace = None;
    for part in head.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.strip_prefix('*') {
            Some(rest) => {
                namespace = rest.trim().strip_prefix("as").map(|n| n.trim().to_string());
            }
            None => default = Some(part.to_string()),
        }
    }

    let destructure = named.map(|list| {
        specifier_list(list)
            .into_iter()
            .map(|(imported, local)| {
                if imported == local {
                    local
                } else {
                    format!("{imported}: {local}")
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    });

    let uses = default.is_some() as usize + namespace.is_some() as usize + destructure.is_some() as usize;
    let module = if uses > 1 && namespace.is_none() {
        let var = format!("__kiln_i{temp}");
        *temp += 1;
        Some(var)
    } else {
        namespace.clone()
    };

    let mut out = Vec::new();
    if let Some(var) = &module {
        out.push(format!("const {var} = {require};"));
    }
    let source = module.as_deref().unwrap_or(require);
    if let Some(name) = default {
        out.push(format!("const {name} = __kiln_require__.d({source});"));
    }
    if let Some(list) = destructure {
        out.push(format!("const {{ {list} }} = {source};"));
    }
    if out.is_empty() {
        out.push(format!("{require};"));
    }
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> LinkContext {
        let mut specifiers = FxHashMap::default();
        specifiers.insert("./util".to_string(), ModuleId::from("src/util.js"));
        specifiers.insert("vue".to_string(), ModuleId::from("node_modules/vue/index.js"));
        specifiers.insert("./Page.vue".to_string(), ModuleId::from("src/Page.vue"));
        LinkContext {
            specifiers,
            provided: Vec::new(),
        }
    }

    #[test]
    fn default_and_named_imports() {
        let out = link("import Vue, { nextTick as tick } from 'vue';\nVue.use(tick);\n", &ctx());
        assert!(out.contains(r#"const __kiln_i0 = __kiln_require__("node_modules/vue/index.js");"#));
        assert!(out.contains("const Vue = __kiln_require__.d(__kiln_i0);"));
        assert!(out.contains("const { nextTick: tick } = __kiln_i0;"));
        assert!(out.contains("Vue.use(tick);"));
    }

    #[test]
    fn namespace_and_bare_imports() {
        let out = link("import * as util from './util'\nimport 'vue'\n", &ctx());
        assert!(out.contains(r#"const util = __kiln_require__("src/util.js");"#));
        assert!(out.contains(r#"__kiln_require__("node_modules/vue/index.js");"#));
    }

    #[test]
    fn exports_become_getters() {
        let src = "export const a = 1;\nexport function b() {}\nconst c = 2;\nexport { c as d };\n";
        let out = link(src, &ctx());
        assert!(out.starts_with("__kiln_require__.e(exports, {"));
        for getter in [r#""a": () => a"#, r#""b": () => b"#, r#""d": () => c"#] {
            assert!(out.contains(getter), "missing {getter} in {out}");
        }
        assert!(out.contains("const a = 1;"));
        assert!(out.contains("function b() {}"));
        assert!(!out.contains("export "));
    }

    #[test]
    fn default_export_expression_and_declaration() {
        let out = link("export default { name: 'x' };\n", &ctx());
        assert!(out.contains("exports.default = { name: 'x' };"));

        let out = link("export default function App() {}\n", &ctx());
        assert!(out.contains("function App() {}"));
        assert!(out.contains(r#""default": () => App"#));
    }

    #[test]
    fn re_exports() {
        let out = link("export * from './util';\nexport { h } from 'vue';\n", &ctx());
        assert!(out.contains(r#"__kiln_require__.r(exports, __kiln_require__("src/util.js"));"#));
        assert!(out.contains(r#"const __kiln_x0 = __kiln_require__("node_modules/vue/index.js");"#));
        assert!(out.contains(r#""h": () => __kiln_x0.h"#));
    }

    #[test]
    fn require_and_dynamic_import() {
        let out = link("const u = require('./util');\nconst p = () => import('./Page.vue');\n", &ctx());
        assert!(out.contains(r#"const u = __kiln_require__("src/util.js");"#));
        assert!(out.contains(r#"() => __kiln_require__.l("src/Page.vue")"#));
        assert!(!out.contains("__kiln_require__.e("));
    }

    #[test]
    fn commented_imports_are_left_alone() {
        let src = "// import x from './util'\nconst a = 1;\n";
        assert_eq!(link(src, &ctx()), src);
    }

    #[test]
    fn provided_bindings_are_declared_first() {
        let mut ctx = ctx();
        ctx.provided
            .push(("process".into(), ModuleId::from("node_modules/process/browser.js")));
        let out = link("if (process.env.X) {}\n", &ctx);
        assert!(out.starts_with(
            r#"var process = __kiln_require__("node_modules/process/browser.js");"#
        ));
    }
}

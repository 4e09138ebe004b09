//! Import reference scanning.
//!
//! A lexical scan, not a parse: comments are blanked out first, then a small
//! set of patterns picks up module references from scripts and stylesheets.

use indexmap::IndexMap;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How one module refers to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import … from`, `export … from`, bare `import '…'`, `require('…')`
    Static,
    /// `import('…')`; the target may start a lazy chunk
    Dynamic,
    /// Implicit edge from the provide table
    Provided,
    /// `@import` or `url()` in a stylesheet
    StyleUrl,
}

impl ImportKind {
    /// Edges that load eagerly with the importing module.
    pub fn is_eager(self) -> bool {
        !matches!(self, ImportKind::Dynamic)
    }
}

/// A reference found in a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportRecord {
    pub specifier: String,
    pub kind: ImportKind,
}

impl ImportRecord {
    pub fn new(specifier: impl Into<String>, kind: ImportKind) -> Self {
        Self {
            specifier: specifier.into(),
            kind,
        }
    }
}

struct Provided {
    identifier: String,
    specifier: String,
    mention: Regex,
    binding: Regex,
}

pub struct ImportScanner {
    static_import: Regex,
    re_export: Regex,
    dynamic_import: Regex,
    require: Regex,
    css_import: Regex,
    css_url: Regex,
    provided: Vec<Provided>,
}

impl ImportScanner {
    /// Scanner with implicit edges for each `identifier → specifier` pair.
    pub fn new(provide: &IndexMap<String, String>) -> Result<Self> {
        let provided = provide
            .iter()
            .map(|(identifier, specifier)| {
                let id = regex::escape(identifier);
                Ok(Provided {
                    identifier: identifier.clone(),
                    specifier: specifier.clone(),
                    mention: Regex::new(&format!(r"(?:^|[^.\w$]){id}(?:[^\w$]|$)"))?,
                    binding: Regex::new(&format!(
                        r"(?:\b(?:var|let|const|function|class)\s+{id}\b|\bimport\s+{id}\b|\bimport\s*\{{[^}}]*\b{id}\b[^}}]*\}})"
                    ))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            static_import: Regex::new(
                r#"(?:^|[;\s}])import\s+(?:[\w$*{},\s]+?\s+from\s*)?["']([^"'\n]+)["']"#,
            )?,
            re_export: Regex::new(
                r#"(?:^|[;\s}])export\s+(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s*["']([^"'\n]+)["']"#,
            )?,
            dynamic_import: Regex::new(r#"\bimport\s*\(\s*["']([^"'\n]+)["']\s*\)"#)?,
            require: Regex::new(r#"\brequire\s*\(\s*["']([^"'\n]+)["']\s*\)"#)?,
            css_import: Regex::new(
                r#"@import\s+(?:url\(\s*)?["']?([^"')\s;]+)["']?\s*\)?"#,
            )?,
            css_url: Regex::new(r#"url\(\s*["']?([^"')\s]+)["']?\s*\)"#)?,
            provided,
        })
    }

    /// References in a script, in source order, deduplicated.
    ///
    /// Includes implicit provided edges for identifiers that are mentioned
    /// but neither imported nor declared.
    pub fn scan_script(&self, source: &str) -> Vec<ImportRecord> {
        let code = strip_comments(source, true);
        let mut found: Vec<(usize, ImportRecord)> = Vec::new();

        for (re, kind) in [
            (&self.static_import, ImportKind::Static),
            (&self.re_export, ImportKind::Static),
            (&self.require, ImportKind::Static),
            (&self.dynamic_import, ImportKind::Dynamic),
        ] {
            for caps in re.captures_iter(&code) {
                if let Some(m) = caps.get(1) {
                    found.push((m.start(), ImportRecord::new(m.as_str(), kind)));
                }
            }
        }
        found.sort_by_key(|(pos, _)| *pos);

        let mut records = dedupe(found.into_iter().map(|(_, r)| r));

        for provided in &self.provided {
            let already = records.iter().any(|r| r.specifier == provided.specifier);
            if !already
                && provided.mention.is_match(&code)
                && !provided.binding.is_match(&code)
            {
                tracing::trace!(identifier = %provided.identifier, "implicit provide edge");
                records.push(ImportRecord::new(&provided.specifier, ImportKind::Provided));
            }
        }

        records
    }

    /// `@import` and `url()` references in a stylesheet.
    ///
    /// Data URIs, absolute URLs and fragment-only references are skipped.
    pub fn scan_stylesheet(&self, source: &str) -> Vec<ImportRecord> {
        let code = strip_comments(source, false);
        let mut found: Vec<(usize, ImportRecord)> = Vec::new();

        for re in [&self.css_import, &self.css_url] {
            for caps in re.captures_iter(&code) {
                let Some(m) = caps.get(1) else { continue };
                if is_external_url(m.as_str()) {
                    continue;
                }
                let specifier = strip_query(m.as_str());
                found.push((m.start(), ImportRecord::new(specifier, ImportKind::StyleUrl)));
            }
        }
        found.sort_by_key(|(pos, _)| *pos);

        dedupe(found.into_iter().map(|(_, r)| r))
    }
}

fn dedupe(records: impl Iterator<Item = ImportRecord>) -> Vec<ImportRecord> {
    let mut seen = FxHashSet::default();
    records.filter(|r| seen.insert(r.clone())).collect()
}

fn is_external_url(url: &str) -> bool {
    url.starts_with("data:")
        || url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("//")
        || url.starts_with('#')
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Blank out comments while keeping byte offsets and string literals intact.
///
/// `line_comments` enables `//` comments (scripts only; `//` is legal inside
/// stylesheet URLs).
pub fn strip_comments(source: &str, line_comments: bool) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Str(u8),
        Line,
        Block,
    }

    let bytes = source.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = State::Code;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            State::Code => match (b, next) {
                (b'/', Some(b'*')) => {
                    state = State::Block;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'/', Some(b'/')) if line_comments => {
                    state = State::Line;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'"' | b'\'' | b'`', _) => {
                    state = State::Str(b);
                    out.push(b);
                }
                _ => out.push(b),
            },
            State::Str(quote) => {
                out.push(b);
                if b == b'\\' {
                    if let Some(n) = next {
                        out.push(n);
                        i += 2;
                        continue;
                    }
                } else if b == quote || (b == b'\n' && quote != b'`') {
                    state = State::Code;
                }
            }
            State::Line => {
                if b == b'\n' {
                    state = State::Code;
                    out.push(b'\n');
                } else {
                    out.push(blank(b));
                }
            }
            State::Block => {
                if b == b'*' && next == Some(b'/') {
                    state = State::Code;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                out.push(if b == b'\n' { b'\n' } else { blank(b) });
            }
        }
        i += 1;
    }

    // comment bytes became ASCII, everything else was copied whole
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn blank(b: u8) -> u8 {
    if b == b'\t' { b'\t' } else { b' ' }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> ImportScanner {
        let mut provide = IndexMap::new();
        provide.insert("process".to_string(), "process/browser".to_string());
        ImportScanner::new(&provide).unwrap()
    }

    fn specs(records: &[ImportRecord]) -> Vec<(&str, ImportKind)> {
        records
            .iter()
            .map(|r| (r.specifier.as_str(), r.kind))
            .collect()
    }

    #[test]
    fn finds_static_forms_in_order() {
        let src = r#"
import Vue from 'vue';
import { a, b as c } from "./util";
import './side-effect.css';
export * from './reexport';
export { x } from './named';
const lodash = require('lodash');
"#;
        let records = scanner().scan_script(src);
        assert_eq!(
            specs(&records),
            vec![
                ("vue", ImportKind::Static),
                ("./util", ImportKind::Static),
                ("./side-effect.css", ImportKind::Static),
                ("./reexport", ImportKind::Static),
                ("./named", ImportKind::Static),
                ("lodash", ImportKind::Static),
            ]
        );
    }

    #[test]
    fn multiline_named_import() {
        let src = "import {\n  one,\n  two,\n} from './many';\n";
        assert_eq!(specs(&scanner().scan_script(src)), vec![("./many", ImportKind::Static)]);
    }

    #[test]
    fn dynamic_import_is_lazy() {
        let src = "button.onclick = () => import('./views/Settings.vue');";
        assert_eq!(
            specs(&scanner().scan_script(src)),
            vec![("./views/Settings.vue", ImportKind::Dynamic)]
        );
    }

    #[test]
    fn commented_imports_are_ignored() {
        let src = "// import a from './a';\n/* import b from './b'; */\nimport c from './c';\n";
        assert_eq!(specs(&scanner().scan_script(src)), vec![("./c", ImportKind::Static)]);
    }

    #[test]
    fn url_inside_string_survives_comment_stripping() {
        let src = "const u = 'http://example.com'; import x from './x';";
        assert_eq!(specs(&scanner().scan_script(src)), vec![("./x", ImportKind::Static)]);
    }

    #[test]
    fn provide_adds_implicit_edge() {
        let src = "if (process.env.NODE_ENV === 'production') {}\n";
        assert_eq!(
            specs(&scanner().scan_script(src)),
            vec![("process/browser", ImportKind::Provided)]
        );
    }

    #[test]
    fn provide_skips_declared_and_property_uses() {
        let s = scanner();
        assert!(s.scan_script("var process = {};\nprocess.x = 1;\n").is_empty());
        assert!(s.scan_script("job.process();\n").is_empty());
        assert!(s.scan_script("import process from 'process/browser';\nprocess.cwd();\n")
            .iter()
            .all(|r| r.kind == ImportKind::Static));
    }

    #[test]
    fn stylesheet_references() {
        let src = r#"
@import './base.css';
@import url("theme.css");
/* url(ignored.png) */
.logo { background: url(../img/logo.png?v=2); }
.x { background: url(data:image/png;base64,AAAA); }
.y { background: url('https://cdn.example.com/a.png'); }
@font-face { src: url('./fonts/Inter.woff2') format('woff2'); }
"#;
        let records = scanner().scan_stylesheet(src);
        assert_eq!(
            specs(&records),
            vec![
                ("./base.css", ImportKind::StyleUrl),
                ("theme.css", ImportKind::StyleUrl),
                ("../img/logo.png", ImportKind::StyleUrl),
                ("./fonts/Inter.woff2", ImportKind::StyleUrl),
            ]
        );
    }

    #[test]
    fn strip_comments_keeps_offsets() {
        let src = "a /* b */ c // d\ne";
        let out = strip_comments(src, true);
        assert_eq!(out.len(), src.len());
        assert_eq!(out, "a         c     \ne");
    }
}

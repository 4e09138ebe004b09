//! Advisory source checks.
//!
//! Findings are reported as warnings and never fail a build.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use kiln_graph::{AssetKind, strip_comments};
use regex::Regex;
use serde::Serialize;

static DEBUGGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdebugger\b").expect("debugger pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LintKind {
    TrailingWhitespace,
    MissingFinalNewline,
    /// `debugger` statement left in a script
    Debugger,
    /// Indentation mixing tabs and spaces on one line
    MixedIndentation,
}

impl fmt::Display for LintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LintKind::TrailingWhitespace => "trailing whitespace",
            LintKind::MissingFinalNewline => "missing final newline",
            LintKind::Debugger => "debugger statement",
            LintKind::MixedIndentation => "mixed tabs and spaces in indentation",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintFinding {
    pub path: PathBuf,
    /// 1-based
    pub line: usize,
    pub kind: LintKind,
}

impl fmt::Display for LintFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.path.display(), self.line, self.kind)
    }
}

/// Check one source file. Only scripts, components and stylesheets are
/// inspected; other kinds yield nothing.
pub fn check(path: &Path, kind: AssetKind, source: &str) -> Vec<LintFinding> {
    if !kind.is_scannable() {
        return Vec::new();
    }

    let finding = |line: usize, kind: LintKind| LintFinding {
        path: path.to_path_buf(),
        line,
        kind,
    };
    let mut findings = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let number = index + 1;
        if line.ends_with([' ', '\t']) {
            findings.push(finding(number, LintKind::TrailingWhitespace));
        }
        let indent: &str = &line[..line.len() - line.trim_start_matches([' ', '\t']).len()];
        if indent.contains(' ') && indent.contains('\t') {
            findings.push(finding(number, LintKind::MixedIndentation));
        }
    }

    if kind != AssetKind::Stylesheet {
        let code = strip_comments(source, true);
        for m in DEBUGGER.find_iter(&code) {
            let line = code[..m.start()].matches('\n').count() + 1;
            findings.push(finding(line, LintKind::Debugger));
        }
    }

    if !source.is_empty() && !source.ends_with('\n') {
        findings.push(finding(source.lines().count(), LintKind::MissingFinalNewline));
    }

    findings.sort_by_key(|f| f.line);
    findings
}

/// Findings of one build, in file then line order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LintReport {
    findings: Vec<LintFinding>,
}

impl LintReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = LintFinding>) {
        self.findings.extend(findings);
    }

    pub fn findings(&self) -> &[LintFinding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn count(&self, kind: LintKind) -> usize {
        self.findings.iter().filter(|f| f.kind == kind).count()
    }

    /// Emit every finding as a `warn` event.
    pub fn log(&self) {
        for finding in &self.findings {
            tracing::warn!(
                path = %finding.path.display(),
                line = finding.line,
                "lint: {}",
                finding.kind
            );
        }
    }
}

//! Formatting utilities for sizes, durations and the build summary.

use std::time::Duration;

use kiln_bundler::BuildOutput;
use kiln_bundler::chunks::RUNTIME_MODULE;
use owo_colors::OwoColorize;

use super::paint;

/// Format a byte count in the largest fitting unit.
///
/// ```
/// use kiln_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.2} {}", UNITS[unit])
    }
}

/// Format a duration as `ms`, `s` or `m s`.
///
/// ```
/// use std::time::Duration;
/// use kiln_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{total_ms}ms")
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// One line of the build summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub file: String,
    /// Chunk kind, or `css` / `html` / `asset`
    pub kind: String,
    /// Chunk name, empty for non-chunk files
    pub chunk: String,
    /// Member modules, `None` for non-chunk files
    pub modules: Option<usize>,
    pub size: u64,
}

/// Summary rows: chunk scripts in load order, extracted stylesheets, the
/// entry document, then every other emitted file by name.
pub fn summary_rows(output: &BuildOutput) -> Vec<SummaryRow> {
    let mut rows = Vec::new();
    let mut listed: Vec<&str> = Vec::new();

    for chunk in output.chunks.iter() {
        let Some(file) = output.chunk_file(&chunk.name) else {
            continue;
        };
        let modules = chunk
            .modules
            .iter()
            .filter(|id| id.as_str() != RUNTIME_MODULE)
            .count();
        rows.push(row(output, file, chunk.kind.to_string(), &chunk.name, Some(modules)));
        listed.push(file);
    }

    for (chunk, file) in &output.stylesheets {
        rows.push(row(output, file, "css".to_string(), chunk, None));
        listed.push(file);
    }

    let mut rest: Vec<&String> = output
        .files
        .keys()
        .filter(|file| !listed.contains(&file.as_str()))
        .collect();
    // the entry document sorts first among the rest
    rest.sort_by(|a, b| (!a.ends_with(".html"), a).cmp(&(!b.ends_with(".html"), b)));
    for file in rest {
        let kind = if file.ends_with(".html") { "html" } else { "asset" };
        rows.push(row(output, file, kind.to_string(), "", None));
    }
    rows
}

fn row(output: &BuildOutput, file: &str, kind: String, chunk: &str, modules: Option<usize>) -> SummaryRow {
    SummaryRow {
        file: file.to_string(),
        kind,
        chunk: chunk.to_string(),
        modules,
        size: output.file_size(file).unwrap_or(0) as u64,
    }
}

/// Render rows as an aligned plain-text table with a total line.
pub fn render_table(rows: &[SummaryRow]) -> String {
    const HEADERS: [&str; 5] = ["File", "Kind", "Chunk", "Modules", "Size"];

    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|r| {
            [
                r.file.clone(),
                r.kind.clone(),
                r.chunk.clone(),
                r.modules.map(|m| m.to_string()).unwrap_or_default(),
                format_size(r.size),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for line in &cells {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, &HEADERS.map(str::to_string), &widths);
    for line in &cells {
        push_line(&mut out, line, &widths);
    }
    let total: u64 = rows.iter().map(|r| r.size).sum();
    out.push_str(&format!("{} files, {} total\n", rows.len(), format_size(total)));
    out
}

fn push_line(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
    let mut line = String::new();
    for (index, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if index > 0 {
            line.push_str("  ");
        }
        // numeric columns align right
        if index >= 3 {
            line.push_str(&format!("{cell:>width$}"));
        } else {
            line.push_str(&format!("{cell:<width$}"));
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Print the build summary table to stdout.
pub fn print_build_summary(output: &BuildOutput) {
    let table = render_table(&summary_rows(output));
    let mut lines = table.lines();
    if let Some(header) = lines.next() {
        println!("{}", paint(header, |s| s.bold().to_string()));
    }
    for line in lines {
        println!("{line}");
    }
}

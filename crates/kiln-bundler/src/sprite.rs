//! Icon sprite.
//!
//! Every vector icon becomes a `<symbol>` in one hidden inline `<svg>` that
//! the entry document carries; markup refers to icons as `#icon-<name>`.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSymbol {
    pub id: String,
    pub source: PathBuf,
    pub view_box: Option<String>,
    /// Markup between the icon's `<svg>` tags
    pub body: String,
}

impl SpriteSymbol {
    fn render(&self) -> String {
        match &self.view_box {
            Some(view_box) => format!(
                r#"<symbol id="{}" viewBox="{}">{}</symbol>"#,
                self.id, view_box, self.body
            ),
            None => format!(r#"<symbol id="{}">{}</symbol>"#, self.id, self.body),
        }
    }
}

/// Symbol id → symbol. Ids come from the file stem, so two icons with the
/// same file name in different directories collide.
#[derive(Debug)]
pub struct SpriteTable {
    symbol_id: String,
    symbols: Mutex<IndexMap<String, SpriteSymbol>>,
}

impl SpriteTable {
    /// Table naming symbols with `symbol_id` (`[name]` is the file stem).
    pub fn new(symbol_id: impl Into<String>) -> Self {
        Self {
            symbol_id: symbol_id.into(),
            symbols: Mutex::new(IndexMap::new()),
        }
    }

    pub fn symbol_id_for(&self, path: &Path) -> String {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("icon");
        self.symbol_id.replace("[name]", stem)
    }

    /// Register an icon and return its symbol id.
    ///
    /// Registering the same file again is a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::DuplicateSymbolId`] when another file already owns the id.
    pub fn register(&self, path: &Path, svg: &str) -> Result<String> {
        let id = self.symbol_id_for(path);
        let mut symbols = self.symbols.lock();

        if let Some(existing) = symbols.get(&id) {
            if existing.source == path {
                return Ok(id);
            }
            return Err(Error::DuplicateSymbolId {
                id,
                first: existing.source.clone(),
                second: path.to_path_buf(),
            });
        }

        let (view_box, body) = parse_svg(svg);
        tracing::debug!(id = %id, path = %path.display(), "sprite symbol registered");
        symbols.insert(
            id.clone(),
            SpriteSymbol {
                id: id.clone(),
                source: path.to_path_buf(),
                view_box,
                body,
            },
        );
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Option<SpriteSymbol> {
        self.symbols.lock().get(id).cloned()
    }

    /// Id of the symbol registered for `path`, if any.
    pub fn id_of(&self, path: &Path) -> Option<String> {
        self.symbols
            .lock()
            .values()
            .find(|s| s.source == path)
            .map(|s| s.id.clone())
    }

    pub fn len(&self) -> usize {
        self.symbols.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.lock().is_empty()
    }

    /// Symbol ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.symbols.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The hidden sprite document, symbols sorted by id. Empty when there
    /// are no icons.
    pub fn render(&self) -> String {
        let symbols = self.symbols.lock();
        if symbols.is_empty() {
            return String::new();
        }
        let mut sorted: Vec<&SpriteSymbol> = symbols.values().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));

        let mut out = String::from(
            r#"<svg xmlns="http://www.w3.org/2000/svg" aria-hidden="true" style="position:absolute;width:0;height:0;overflow:hidden">"#,
        );
        for symbol in sorted {
            out.push_str(&symbol.render());
        }
        out.push_str("</svg>");
        out
    }
}

/// `viewBox` and inner markup of an svg document. Input without an `<svg>`
/// element is taken as the body verbatim.
fn parse_svg(svg: &str) -> (Option<String>, String) {
    let Some(open) = svg.find("<svg") else {
        return (None, svg.trim().to_string());
    };
    let Some(tag_len) = svg[open..].find('>') else {
        return (None, String::new());
    };
    let tag = &svg[open..open + tag_len];
    let body_start = open + tag_len + 1;
    let body_end = svg.rfind("</svg>").filter(|&end| end >= body_start).unwrap_or(svg.len());

    let view_box = tag.find("viewBox=").and_then(|pos| {
        let rest = &tag[pos + "viewBox=".len()..];
        let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
        let rest = &rest[1..];
        rest.find(quote).map(|end| rest[..end].to_string())
    });

    (view_box, svg[body_start..body_end].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARROW: &str = r#"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M0 0L24 12"/></svg>
"#;

    #[test]
    fn registers_by_stem() {
        let table = SpriteTable::new("icon-[name]");
        let id = table.register(Path::new("/p/src/icons/arrow.svg"), ARROW).unwrap();
        assert_eq!(id, "icon-arrow");

        let symbol = table.get("icon-arrow").unwrap();
        assert_eq!(symbol.view_box.as_deref(), Some("0 0 24 24"));
        assert_eq!(symbol.body, r#"<path d="M0 0L24 12"/>"#);
    }

    #[test]
    fn same_stem_in_other_directory_collides() {
        let table = SpriteTable::new("icon-[name]");
        table.register(Path::new("/p/src/icons/a/arrow.svg"), ARROW).unwrap();
        let err = table
            .register(Path::new("/p/src/icons/b/arrow.svg"), ARROW)
            .unwrap_err();
        match err {
            Error::DuplicateSymbolId { id, first, second } => {
                assert_eq!(id, "icon-arrow");
                assert!(first.ends_with("a/arrow.svg"));
                assert!(second.ends_with("b/arrow.svg"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn re_registering_same_file_is_fine() {
        let table = SpriteTable::new("icon-[name]");
        let path = Path::new("/p/src/icons/arrow.svg");
        table.register(path, ARROW).unwrap();
        table.register(path, ARROW).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.id_of(path).as_deref(), Some("icon-arrow"));
    }

    #[test]
    fn render_sorts_symbols() {
        let table = SpriteTable::new("i-[name]");
        table.register(Path::new("zoom.svg"), "<svg><g/></svg>").unwrap();
        table.register(Path::new("add.svg"), "<svg><g/></svg>").unwrap();
        let sprite = table.render();
        let add = sprite.find(r#"id="i-add""#).unwrap();
        let zoom = sprite.find(r#"id="i-zoom""#).unwrap();
        assert!(add < zoom);
        assert!(sprite.ends_with("</svg>"));
    }

    #[test]
    fn empty_table_renders_nothing() {
        assert_eq!(SpriteTable::new("icon-[name]").render(), "");
    }
}

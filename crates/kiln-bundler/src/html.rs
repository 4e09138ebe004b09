//! Entry document generation.
//!
//! The template is rendered with `minijinja` (`title`, `lang` and
//! `public_path` are in scope), then the build's tags are spliced in:
//! favicon and stylesheet links before `</head>`, the icon sprite right
//! after the `<body>` open tag and one deferred script per chunk before
//! `</body>`.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use kiln_config::BuildOptions;
use minijinja::{Environment, context};

use crate::chunks::ChunkSet;
use crate::transform::public_url;
use crate::{Error, Result};

/// Everything the document needs besides the chunk set.
#[derive(Debug, Clone, Default)]
pub struct HtmlContext {
    pub title: String,
    pub lang: String,
    pub public_path: String,
    /// Output filename of the favicon
    pub favicon: Option<String>,
    /// Chunk name → emitted script filename
    pub scripts: IndexMap<String, String>,
    /// Chunk name → extracted stylesheet filename
    pub stylesheets: IndexMap<String, String>,
    /// Rendered sprite sheet, empty without icons
    pub sprite: String,
}

impl HtmlContext {
    pub fn new(options: &BuildOptions) -> Self {
        Self {
            title: options.title.clone(),
            lang: options.lang.clone(),
            public_path: options.output.public_path.clone(),
            ..Self::default()
        }
    }

    fn url(&self, filename: &str) -> String {
        attr(&public_url(&self.public_path, filename))
    }

    fn head_tags(&self, chunks: &ChunkSet) -> String {
        let mut tags = String::new();
        if let Some(favicon) = &self.favicon {
            tags.push_str(&format!("<link rel=\"icon\" href=\"{}\">", self.url(favicon)));
        }
        for name in chunks.load_order() {
            if let Some(file) = self.stylesheets.get(name) {
                tags.push_str(&format!("<link href=\"{}\" rel=\"stylesheet\">", self.url(file)));
            }
        }
        tags
    }

    fn body_tags(&self, chunks: &ChunkSet) -> String {
        chunks
            .load_order()
            .into_iter()
            .filter_map(|name| self.scripts.get(name))
            .map(|file| format!("<script defer src=\"{}\"></script>", self.url(file)))
            .collect()
    }
}

/// A loaded entry document template.
#[derive(Debug, Clone)]
pub struct EntryDocument {
    path: PathBuf,
    source: String,
}

impl EntryDocument {
    /// Read the template at `path`.
    ///
    /// # Errors
    ///
    /// `TemplateNotFound` when the file does not exist.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(Error::TemplateNotFound { path });
        }
        let source = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        Ok(Self { path, source })
    }

    pub fn from_source(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the template and inject the build's tags.
    pub fn render(&self, chunks: &ChunkSet, ctx: &HtmlContext) -> Result<String> {
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("index.html");
        let env = Environment::new();
        let template_error = |source: minijinja::Error| Error::Template {
            path: self.path.clone(),
            source,
        };
        let rendered = env
            .template_from_named_str(name, &self.source)
            .and_then(|template| {
                template.render(context! {
                    title => &ctx.title,
                    lang => &ctx.lang,
                    public_path => &ctx.public_path,
                })
            })
            .map_err(template_error)?;

        let html = insert_before(&rendered, "</head>", &ctx.head_tags(chunks));
        let html = insert_after_body_open(&html, &ctx.sprite);
        Ok(insert_before(&html, "</body>", &ctx.body_tags(chunks)))
    }
}

/// Load `template_path` and render it for `chunks`.
pub fn generate(template_path: &Path, chunks: &ChunkSet, ctx: &HtmlContext) -> Result<String> {
    EntryDocument::load(template_path)?.render(chunks, ctx)
}

/// Insert `tags` before the first `marker` (ASCII case-insensitive), or at
/// the end when the marker is missing.
fn insert_before(html: &str, marker: &str, tags: &str) -> String {
    if tags.is_empty() {
        return html.to_string();
    }
    let at = html.to_ascii_lowercase().find(marker).unwrap_or(html.len());
    let mut out = String::with_capacity(html.len() + tags.len());
    out.push_str(&html[..at]);
    out.push_str(tags);
    out.push_str(&html[at..]);
    out
}

fn insert_after_body_open(html: &str, content: &str) -> String {
    if content.is_empty() {
        return html.to_string();
    }
    let lower = html.to_ascii_lowercase();
    let open = lower
        .match_indices("<body")
        .find(|(i, _)| {
            lower[i + 5..]
                .chars()
                .next()
                .is_some_and(|c| c == '>' || c.is_ascii_whitespace())
        })
        .and_then(|(i, _)| lower[i..].find('>').map(|end| i + end + 1));
    let at = open.unwrap_or(0);
    let mut out = String::with_capacity(html.len() + content.len());
    out.push_str(&html[..at]);
    out.push_str(content);
    out.push_str(&html[at..]);
    out
}

fn attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

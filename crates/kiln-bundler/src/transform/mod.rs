//! Transform dispatch: one transform per [`AssetKind`].
//!
//! | kind          | result                                                   |
//! |---------------|----------------------------------------------------------|
//! | Script        | [`Transpiler`] output                                    |
//! | Component     | [`ComponentCompiler`], then the transpiler               |
//! | Stylesheet    | injected at runtime, or extracted into the chunk's CSS   |
//! | RasterImage   | emitted under `output.images`, exports the URL           |
//! | Font          | inlined as a data URI up to `fonts.inline_limit`         |
//! | VectorIcon    | sprite symbol, exports `#<symbol id>`                    |
//! | Unclassified  | emitted verbatim under `output.assets` (JSON is inlined) |
//!
//! Asset kinds must be dispatched before code kinds: stylesheets and scripts
//! read the URLs the asset transforms publish.

mod component;
mod link;
mod script;
mod style;

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use indexmap::IndexMap;
use kiln_config::{BuildOptions, FontOptions, OutputOptions};
use kiln_graph::{AssetKind, ImportKind, Module, ModuleId, content_type};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

pub use component::{
    COMPONENT_BINDING, CompiledComponent, CompiledStyle, ComponentCompiler,
    DefaultComponentCompiler,
};
pub use link::{LinkContext, js_string, link};
pub use script::{DefaultTranspiler, ScriptSource, SyntaxError, Transpiler, check_delimiters};
pub use style::{RewrittenStyle, rewrite_stylesheet};

use crate::emit::{EmissionTable, OutputFile, dotted_extension, render_filename};
use crate::sprite::SpriteTable;
use crate::{Error, Result};

/// A module after its transform: the body of its registry function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedUnit {
    pub id: ModuleId,
    pub kind: AssetKind,
    pub code: String,
    /// Extracted CSS, when `css.extract` is on
    pub css: Option<String>,
    /// Output file emitted for the module
    pub emitted: Option<String>,
}

impl TransformedUnit {
    fn new(module: &Module, code: String) -> Self {
        Self {
            id: module.id.clone(),
            kind: module.kind,
            code,
            css: None,
            emitted: None,
        }
    }
}

/// Is this kind handled in the asset phase?
pub fn is_asset(kind: AssetKind) -> bool {
    !kind.is_scannable()
}

/// `public_path` joined with an output filename.
pub fn public_url(public_path: &str, filename: &str) -> String {
    if public_path.is_empty() || public_path.ends_with('/') {
        format!("{public_path}{filename}")
    } else {
        format!("{public_path}/{filename}")
    }
}

/// Transform collaborators plus the shared tables they write into.
pub struct Transforms {
    transpiler: Arc<dyn Transpiler>,
    compiler: Arc<dyn ComponentCompiler>,
    emissions: Arc<EmissionTable>,
    sprite: Arc<SpriteTable>,
    output: OutputOptions,
    fonts: FontOptions,
    extract_css: bool,
    provide: IndexMap<String, String>,
    urls: Mutex<FxHashMap<ModuleId, String>>,
}

impl Transforms {
    pub fn new(options: &BuildOptions, emissions: Arc<EmissionTable>, sprite: Arc<SpriteTable>) -> Self {
        Self {
            transpiler: Arc::new(DefaultTranspiler),
            compiler: Arc::new(DefaultComponentCompiler),
            emissions,
            sprite,
            output: options.output.clone(),
            fonts: options.fonts.clone(),
            extract_css: options.css.extract,
            provide: options.provide.clone(),
            urls: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn with_transpiler(mut self, transpiler: Arc<dyn Transpiler>) -> Self {
        self.transpiler = transpiler;
        self
    }

    pub fn with_component_compiler(mut self, compiler: Arc<dyn ComponentCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    /// URL (or data URI, or sprite fragment) published for an asset module.
    pub fn url_of(&self, id: &ModuleId) -> Option<String> {
        self.urls.lock().get(id).cloned()
    }

    /// Transform one module given its source bytes.
    pub fn dispatch(&self, module: &Module, source: &[u8]) -> Result<TransformedUnit> {
        tracing::debug!(module = %module.id, kind = %module.kind, "transform");
        match module.kind {
            AssetKind::Script => {
                let code = self.script(module, text(module, source)?)?;
                Ok(TransformedUnit::new(module, code))
            }
            AssetKind::Component => self.component(module, text(module, source)?),
            AssetKind::Stylesheet => self.stylesheet(module, text(module, source)?),
            AssetKind::RasterImage => {
                let filename = self.emit(module, &self.output.images, source)?;
                Ok(self.url_module(module, public_url(&self.output.public_path, &filename), Some(filename)))
            }
            AssetKind::Font => self.font(module, source),
            AssetKind::VectorIcon => {
                let id = match self.sprite.id_of(&module.path) {
                    Some(id) => id,
                    None => self.sprite.register(&module.path, text(module, source)?)?,
                };
                Ok(self.url_module(module, format!("#{id}"), None))
            }
            AssetKind::Unclassified if is_json(&module.path) => {
                let value: serde_json::Value =
                    serde_json::from_slice(source).map_err(|e| Error::Transform {
                        path: module.path.clone(),
                        message: e.to_string(),
                    })?;
                Ok(TransformedUnit::new(module, format!("module.exports = {value};\n")))
            }
            AssetKind::Unclassified => {
                let filename = self.emit(module, &self.output.assets, source)?;
                Ok(self.url_module(module, public_url(&self.output.public_path, &filename), Some(filename)))
            }
        }
    }

    fn emit(&self, module: &Module, template: &str, source: &[u8]) -> Result<String> {
        let name = module
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("asset");
        let filename = render_filename(
            template,
            name,
            &dotted_extension(&module.path),
            source,
            self.output.hash_length,
        );
        self.emissions
            .emit(OutputFile::new(filename.clone(), source, &module.path))?;
        Ok(filename)
    }

    fn url_module(&self, module: &Module, url: String, emitted: Option<String>) -> TransformedUnit {
        let code = format!("module.exports = {};\n", js_string(&url));
        self.urls.lock().insert(module.id.clone(), url);
        TransformedUnit {
            emitted,
            ..TransformedUnit::new(module, code)
        }
    }

    fn font(&self, module: &Module, source: &[u8]) -> Result<TransformedUnit> {
        let inline = self
            .fonts
            .inline_limit
            .is_none_or(|limit| source.len() as u64 <= limit);
        if inline {
            let encoded = base64::engine::general_purpose::STANDARD.encode(source);
            let uri = format!("data:{};base64,{encoded}", content_type(&module.path));
            return Ok(self.url_module(module, uri, None));
        }
        let filename = self.emit(module, &self.output.fonts, source)?;
        Ok(self.url_module(module, public_url(&self.output.public_path, &filename), Some(filename)))
    }

    fn link_context(&self, module: &Module) -> LinkContext {
        let mut ctx = LinkContext::default();
        for dep in &module.dependencies {
            ctx.specifiers
                .entry(dep.specifier.clone())
                .or_insert_with(|| dep.target.clone());
            if dep.kind == ImportKind::Provided {
                let identifiers = self
                    .provide
                    .iter()
                    .filter(|(_, specifier)| **specifier == dep.specifier)
                    .map(|(identifier, _)| identifier.clone());
                for identifier in identifiers {
                    ctx.provided.push((identifier, dep.target.clone()));
                }
            }
        }
        ctx
    }

    fn script(&self, module: &Module, code: &str) -> Result<String> {
        let ctx = self.link_context(module);
        // dependency-root modules are linked but not transpiled
        if module.is_dependency {
            return Ok(link(code, &ctx));
        }
        let source = ScriptSource {
            id: &module.id,
            path: &module.path,
            code,
            link: &ctx,
        };
        self.transpiler
            .transpile(&source)
            .map_err(|err| transform_error(&module.path, err))
    }

    fn component(&self, module: &Module, source: &str) -> Result<TransformedUnit> {
        let compiled = self
            .compiler
            .compile(&module.path, source)
            .map_err(|err| transform_error(&module.path, err))?;

        let mut code = String::new();
        let mut extracted = Vec::new();
        for style in &compiled.styles {
            let (requires, css) = self.style_parts(module, &style.css);
            code.push_str(&requires);
            if self.extract_css {
                extracted.push(css);
            } else if !css.is_empty() {
                code.push_str(&inject(&css, &module.id));
            }
        }
        code.push_str(&self.script(module, &compiled.script)?);

        Ok(TransformedUnit {
            css: (self.extract_css && !extracted.is_empty()).then(|| extracted.join("\n")),
            ..TransformedUnit::new(module, code)
        })
    }

    fn stylesheet(&self, module: &Module, source: &str) -> Result<TransformedUnit> {
        let (mut code, css) = self.style_parts(module, source);
        if self.extract_css {
            return Ok(TransformedUnit {
                css: Some(css),
                ..TransformedUnit::new(module, code)
            });
        }
        code.push_str(&inject(&css, &module.id));
        Ok(TransformedUnit::new(module, code))
    }

    /// `require` lines for `@import`ed sheets, and the rewritten CSS.
    fn style_parts(&self, module: &Module, css: &str) -> (String, String) {
        let urls = self.urls.lock();
        let rewritten = rewrite_stylesheet(css, &module.dependencies, &urls);
        let requires = rewritten
            .imports
            .iter()
            .map(|id| format!("__kiln_require__({});\n", js_string(id.as_str())))
            .collect();
        (requires, rewritten.css)
    }
}

fn inject(css: &str, id: &ModuleId) -> String {
    format!("__kiln_require__.s({}, {});\n", js_string(css), js_string(id.as_str()))
}

fn text<'a>(module: &Module, source: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(source).map_err(|e| Error::Transform {
        path: module.path.clone(),
        message: format!("not valid UTF-8: {e}"),
    })
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn transform_error(path: &Path, err: SyntaxError) -> Error {
    Error::Transform {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

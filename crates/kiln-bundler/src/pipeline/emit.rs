use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexMap;
use kiln_config::PathRole;
use kiln_graph::ImportKind;

use super::{BuildContext, BuildOutput, BuildState, Stage};
use crate::chunks::{Chunk, ChunkKind};
use crate::emit::{OutputFile, render_filename};
use crate::html::{HtmlContext, generate};
use crate::output::{MANIFEST_FILE, Manifest, StagingArea, copy_static};
use crate::runtime::{bootstrap, render_chunk};
use crate::transform::public_url;
use crate::{Error, Result};

/// Renders chunks, stylesheets, the entry document and the manifest, then
/// writes everything through a staging directory.
pub struct EmitStage;

impl Stage for EmitStage {
    fn name(&self) -> &'static str {
        "emit"
    }

    fn state(&self) -> BuildState {
        BuildState::Emitting
    }

    fn run(&self, mut ctx: BuildContext) -> Result<BuildContext> {
        let options = &ctx.options;
        let output = &options.output;
        let mut html = HtmlContext::new(options);
        html.sprite = ctx.sprite.render();

        // Chunks without the bootstrap first: the bootstrap embeds the URLs
        // of the chunks dynamic imports load.
        let (with_runtime, without_runtime): (Vec<&Chunk>, Vec<&Chunk>) =
            ctx.chunks.iter().partition(|c| c.has_runtime());
        for chunk in without_runtime {
            let code = render(&ctx, chunk, "");
            let filename = emit_script(&ctx, chunk, code)?;
            html.scripts.insert(chunk.name.clone(), filename);
        }
        let source = bootstrap(&lazy_targets(&ctx, &html.scripts));
        for chunk in with_runtime {
            let code = render(&ctx, chunk, &source);
            let filename = emit_script(&ctx, chunk, code)?;
            html.scripts.insert(chunk.name.clone(), filename);
        }

        if options.css.extract {
            for chunk in ctx.chunks.iter() {
                let css: Vec<&str> = chunk
                    .modules
                    .iter()
                    .filter_map(|id| ctx.units.get(id)?.css.as_deref())
                    .filter(|css| !css.is_empty())
                    .collect();
                if css.is_empty() {
                    continue;
                }
                let css = css.join("\n") + "\n";
                let filename = render_filename(
                    &output.css_filename,
                    &chunk.name,
                    ".css",
                    css.as_bytes(),
                    output.hash_length,
                );
                ctx.emissions
                    .emit(OutputFile::new(filename.clone(), css, PathBuf::from(&chunk.name)))?;
                html.stylesheets.insert(chunk.name.clone(), filename);
            }
        }

        if let Some(favicon) = &options.favicon {
            let path = ctx.registry.project_file("favicon", favicon)?;
            let bytes = fs::read(&path).map_err(|e| Error::io(&path, e))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "favicon.ico".to_string());
            ctx.emissions
                .emit(OutputFile::new(filename.clone(), bytes, &path))?;
            html.favicon = Some(filename);
        }

        let template = ctx.registry.project_file("template", &options.template)?;
        let document = generate(&template, &ctx.chunks, &html)?;
        ctx.emissions.emit(OutputFile::new(
            output.html_filename.clone(),
            document.clone(),
            &template,
        ))?;

        let mut files = ctx.emissions.take();
        let manifest = if output.manifest {
            let assets = files
                .iter()
                .map(|f| f.filename.clone())
                .filter(|name| {
                    *name != output.html_filename
                        && !html.scripts.values().any(|s| s == name)
                        && !html.stylesheets.values().any(|s| s == name)
                })
                .collect();
            let manifest = Manifest::new(
                output.html_filename.clone(),
                &ctx.chunks,
                |name| html.scripts.get(name).cloned(),
                |name| html.stylesheets.get(name).cloned(),
                assets,
            );
            files.push(OutputFile::new(MANIFEST_FILE, manifest.to_json()?, &template));
            Some(manifest)
        } else {
            None
        };

        let output_dir = ctx.output_dir();
        let mut staging = StagingArea::new(&output_dir)?;
        for file in &files {
            staging.write(&file.filename, &file.contents, &file.source)?;
        }
        let static_files = copy_static(
            ctx.registry.resolve(PathRole::Static),
            &output.static_dir,
            &mut staging,
        )?;
        let written = staging.promote()?;
        tracing::info!(
            files = written.len(),
            dir = %output_dir.display(),
            "output written"
        );

        let result = BuildOutput {
            output_dir,
            html: document,
            chunks: ctx.chunks.clone(),
            chunk_files: html.scripts,
            stylesheets: html.stylesheets,
            files: files
                .into_iter()
                .map(|f| (f.filename.clone(), f.size()))
                .collect::<IndexMap<_, _>>(),
            static_files,
            sprite: ctx.sprite.ids(),
            lint: ctx.lint.clone(),
            manifest,
            modules: ctx.graph.len(),
            states: Vec::new(),
            duration: Duration::ZERO,
        };
        ctx.output = Some(result);
        Ok(ctx)
    }
}

fn render(ctx: &BuildContext, chunk: &Chunk, bootstrap_source: &str) -> String {
    let entry = if chunk.kind == ChunkKind::Entry {
        ctx.graph.entry()
    } else {
        None
    };
    render_chunk(chunk, &ctx.units, entry, bootstrap_source)
}

fn emit_script(ctx: &BuildContext, chunk: &Chunk, code: String) -> Result<String> {
    let output = &ctx.options.output;
    let filename = render_filename(
        &output.filename,
        &chunk.name,
        ".js",
        code.as_bytes(),
        output.hash_length,
    );
    ctx.emissions
        .emit(OutputFile::new(filename.clone(), code, PathBuf::from(&chunk.name)))?;
    Ok(filename)
}

/// Dynamic import target → public URL of the chunk registering it.
fn lazy_targets(ctx: &BuildContext, scripts: &IndexMap<String, String>) -> BTreeMap<String, String> {
    let public_path = &ctx.options.output.public_path;
    let mut targets = BTreeMap::new();
    for module in ctx.graph.modules() {
        for dep in module.dependencies.iter().filter(|d| d.kind == ImportKind::Dynamic) {
            let file = ctx
                .chunks
                .chunk_of(&dep.target)
                .and_then(|chunk| scripts.get(&chunk.name));
            if let Some(file) = file {
                targets.insert(dep.target.as_str().to_string(), public_url(public_path, file));
            }
        }
    }
    targets
}

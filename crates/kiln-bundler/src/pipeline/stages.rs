use std::fs;
use std::sync::Arc;

use kiln_config::{ConfigError, PathRole};
use kiln_graph::{GraphWalker, ImportScanner, Module, ModuleResolver};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::{BuildContext, BuildState, Stage};
use crate::chunks::{ChunkRule, PartitionOptions, partition};
use crate::lint;
use crate::output::clean_dir;
use crate::transform::{TransformedUnit, Transforms, is_asset};
use crate::{Error, Result};

/// Empties the output directory.
pub struct CleanStage;

impl Stage for CleanStage {
    fn name(&self) -> &'static str {
        "clean"
    }

    fn state(&self) -> BuildState {
        BuildState::Cleaning
    }

    fn run(&self, ctx: BuildContext) -> Result<BuildContext> {
        let dir = ctx.output_dir();
        let removed = clean_dir(&dir)?;
        tracing::debug!(dir = %dir.display(), removed, "output directory cleaned");
        Ok(ctx)
    }
}

/// Inventories the source root and registers every icon in the sprite.
pub struct ClassifyStage;

impl Stage for ClassifyStage {
    fn name(&self) -> &'static str {
        "classify"
    }

    fn state(&self) -> BuildState {
        BuildState::Classifying
    }

    fn run(&self, mut ctx: BuildContext) -> Result<BuildContext> {
        ctx.inventory = ctx
            .classifier
            .inventory(ctx.registry.resolve(PathRole::Source))?;

        for icon in ctx.classifier.icons()? {
            let svg = fs::read_to_string(&icon.path).map_err(|e| Error::io(&icon.path, e))?;
            ctx.sprite.register(&icon.path, &svg)?;
        }

        tracing::info!(
            files = ctx.inventory.len(),
            icons = ctx.sprite.len(),
            "sources classified"
        );
        Ok(ctx)
    }
}

/// Advisory checks over the project's own scripts, components and
/// stylesheets. Never fails the build.
pub struct LintStage;

impl Stage for LintStage {
    fn name(&self) -> &'static str {
        "lint"
    }

    fn state(&self) -> BuildState {
        BuildState::Classifying
    }

    fn run(&self, mut ctx: BuildContext) -> Result<BuildContext> {
        if !ctx.options.lint.enabled {
            return Ok(ctx);
        }

        for asset in &ctx.inventory {
            if !asset.kind.is_scannable() || ctx.registry.is_dependency(&asset.path) {
                continue;
            }
            match fs::read_to_string(&asset.path) {
                Ok(source) => ctx.lint.extend(lint::check(&asset.path, asset.kind, &source)),
                Err(e) => {
                    tracing::debug!(path = %asset.path.display(), "skipping lint: {e}");
                }
            }
        }
        ctx.lint.log();
        Ok(ctx)
    }
}

/// Walks the module graph from the entry.
pub struct ResolveStage;

impl Stage for ResolveStage {
    fn name(&self) -> &'static str {
        "resolve"
    }

    fn state(&self) -> BuildState {
        BuildState::Resolving
    }

    fn run(&self, mut ctx: BuildContext) -> Result<BuildContext> {
        let entry = ctx.registry.project_file("entry", &ctx.options.entry)?;
        if !entry.is_file() {
            return Err(ConfigError::EntryNotFound { path: entry }.into());
        }

        let resolver = ModuleResolver::new(
            Arc::clone(&ctx.registry),
            Arc::clone(&ctx.classifier),
            &ctx.options.resolve,
        );
        let scanner = ImportScanner::new(&ctx.options.provide)?;
        ctx.graph = GraphWalker::new(&resolver, &scanner).walk(&entry)?;

        tracing::info!(modules = ctx.graph.len(), "module graph resolved");
        Ok(ctx)
    }
}

/// Runs every module through its kind's transform on the rayon pool.
///
/// Asset kinds go first so stylesheets and scripts can read the URLs they
/// publish.
pub struct TransformStage;

impl Stage for TransformStage {
    fn name(&self) -> &'static str {
        "transform"
    }

    fn state(&self) -> BuildState {
        BuildState::Transforming
    }

    fn run(&self, mut ctx: BuildContext) -> Result<BuildContext> {
        let transforms = Transforms::new(
            &ctx.options,
            Arc::clone(&ctx.emissions),
            Arc::clone(&ctx.sprite),
        )
        .with_transpiler(Arc::clone(&ctx.transpiler))
        .with_component_compiler(Arc::clone(&ctx.compiler));

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(ctx.settings.parallel_jobs.unwrap_or(0))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("parallel_jobs: {e}")))?;

        let (assets, code): (Vec<&Module>, Vec<&Module>) =
            ctx.graph.modules().partition(|m| is_asset(m.kind));

        let units = pool.install(|| -> Result<Vec<TransformedUnit>> {
            let mut units = transform_all(&transforms, &assets)?;
            units.extend(transform_all(&transforms, &code)?);
            Ok(units)
        })?;

        let emitted = units.iter().filter(|u| u.emitted.is_some()).count();
        tracing::info!(
            modules = units.len(),
            emitted,
            threads = pool.current_num_threads(),
            "modules transformed"
        );

        let mut table = FxHashMap::default();
        for unit in units {
            table.insert(unit.id.clone(), unit);
        }
        ctx.units = table;
        Ok(ctx)
    }
}

fn transform_all(transforms: &Transforms, modules: &[&Module]) -> Result<Vec<TransformedUnit>> {
    modules
        .par_iter()
        .map(|module| {
            let source = fs::read(&module.path).map_err(|e| Error::io(&module.path, e))?;
            transforms.dispatch(module, &source)
        })
        .collect()
}

/// Splits the graph into chunks.
pub struct PartitionStage;

impl Stage for PartitionStage {
    fn name(&self) -> &'static str {
        "partition"
    }

    fn state(&self) -> BuildState {
        BuildState::Partitioning
    }

    fn run(&self, mut ctx: BuildContext) -> Result<BuildContext> {
        let rules = ChunkRule::compile_all(&ctx.options.chunks.rules, &ctx.registry)?;
        let options = PartitionOptions::from(&ctx.options.chunks);
        ctx.chunks = partition(&ctx.graph, &rules, &options);

        for chunk in ctx.chunks.iter() {
            tracing::debug!(chunk = %chunk.name, kind = %chunk.kind, modules = chunk.modules.len(), "chunk");
        }
        tracing::info!(
            chunks = ctx.chunks.len(),
            order = ?ctx.chunks.load_order(),
            "graph partitioned"
        );
        Ok(ctx)
    }
}

//! Build orchestration.
//!
//! A build is an ordered list of [`Stage`]s sharing one [`BuildContext`]:
//!
//! ```text
//! clean → classify → lint → resolve → transform → partition → emit
//! ```
//!
//! The orchestrator tracks a [`BuildState`] per stage. The first failing
//! stage moves the build to `Failed` and its error is returned unchanged;
//! nothing after it runs.

mod context;
mod emit;
mod stages;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use kiln_config::{BuildOptions, GlobalSettings, PathRegistry, validate_schema};
use kiln_graph::Classifier;
use serde::Serialize;

pub use context::BuildContext;
pub use emit::EmitStage;
pub use stages::{
    ClassifyStage, CleanStage, LintStage, PartitionStage, ResolveStage, TransformStage,
};

use crate::chunks::ChunkSet;
use crate::lint::LintReport;
use crate::output::Manifest;
use crate::transform::{ComponentCompiler, DefaultComponentCompiler, DefaultTranspiler, Transpiler};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    Idle,
    Cleaning,
    Classifying,
    Resolving,
    Transforming,
    Partitioning,
    Emitting,
    Done,
    Failed,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Done | BuildState::Failed)
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildState::Idle => "idle",
            BuildState::Cleaning => "cleaning",
            BuildState::Classifying => "classifying",
            BuildState::Resolving => "resolving",
            BuildState::Transforming => "transforming",
            BuildState::Partitioning => "partitioning",
            BuildState::Emitting => "emitting",
            BuildState::Done => "done",
            BuildState::Failed => "failed",
        })
    }
}

/// One step of the build.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// State the build is in while this stage runs.
    fn state(&self) -> BuildState;

    fn run(&self, ctx: BuildContext) -> Result<BuildContext>;
}

/// What a successful build produced.
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutput {
    pub output_dir: PathBuf,
    /// The rendered entry document
    pub html: String,
    pub chunks: ChunkSet,
    /// Chunk name → script filename
    pub chunk_files: IndexMap<String, String>,
    /// Chunk name → extracted stylesheet filename
    pub stylesheets: IndexMap<String, String>,
    /// Every emitted filename with its size in bytes, static copies excluded
    pub files: IndexMap<String, usize>,
    pub static_files: Vec<String>,
    /// Sprite symbol ids
    pub sprite: Vec<String>,
    pub lint: LintReport,
    pub manifest: Option<Manifest>,
    /// Modules in the graph
    pub modules: usize,
    /// States the build went through
    pub states: Vec<BuildState>,
    #[serde(skip)]
    pub duration: Duration,
}

impl BuildOutput {
    pub fn chunk_file(&self, chunk: &str) -> Option<&str> {
        self.chunk_files.get(chunk).map(String::as_str)
    }

    pub fn file_size(&self, filename: &str) -> Option<usize> {
        self.files.get(filename).copied()
    }

    /// Total bytes emitted, static copies excluded.
    pub fn total_size(&self) -> usize {
        self.files.values().sum()
    }
}

/// The build orchestrator.
pub struct Pipeline {
    registry: Arc<PathRegistry>,
    options: Arc<BuildOptions>,
    settings: GlobalSettings,
    classifier: Arc<Classifier>,
    transpiler: Arc<dyn Transpiler>,
    compiler: Arc<dyn ComponentCompiler>,
    stages: Vec<Box<dyn Stage>>,
    state: BuildState,
    history: Vec<BuildState>,
}

impl Pipeline {
    /// Build a pipeline for the project at `root`.
    ///
    /// # Errors
    ///
    /// Schema violations in `options` and role directories outside the
    /// project fail here, before anything touches the output directory.
    pub fn new(root: impl AsRef<Path>, options: BuildOptions) -> Result<Self> {
        validate_schema(&options)?;
        let registry = Arc::new(PathRegistry::new(root, &options.paths)?);
        let classifier = Arc::new(Classifier::new(Arc::clone(&registry))?);
        Ok(Self {
            registry,
            options: Arc::new(options),
            settings: GlobalSettings::default(),
            classifier,
            transpiler: Arc::new(DefaultTranspiler),
            compiler: Arc::new(DefaultComponentCompiler),
            stages: Self::default_stages(),
            state: BuildState::Idle,
            history: Vec::new(),
        })
    }

    /// clean, classify, lint, resolve, transform, partition, emit.
    pub fn default_stages() -> Vec<Box<dyn Stage>> {
        vec![
            Box::new(CleanStage),
            Box::new(ClassifyStage),
            Box::new(LintStage),
            Box::new(ResolveStage),
            Box::new(TransformStage),
            Box::new(PartitionStage),
            Box::new(EmitStage),
        ]
    }

    pub fn with_settings(mut self, settings: GlobalSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Worker threads for the transform stage. `0` uses rayon's default.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.settings.parallel_jobs = (jobs > 0).then_some(jobs);
        self
    }

    pub fn with_transpiler(mut self, transpiler: Arc<dyn Transpiler>) -> Self {
        self.transpiler = transpiler;
        self
    }

    pub fn with_component_compiler(mut self, compiler: Arc<dyn ComponentCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_stages(mut self, stages: Vec<Box<dyn Stage>>) -> Self {
        self.stages = stages;
        self
    }

    pub fn registry(&self) -> &Arc<PathRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    /// States entered by the last run, in order.
    pub fn states(&self) -> &[BuildState] {
        &self.history
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order.
    pub fn run(&mut self) -> Result<BuildOutput> {
        let started = Instant::now();
        self.history.clear();
        self.enter(BuildState::Idle);
        tracing::info!(root = %self.registry.root().display(), "build started");

        let mut ctx = BuildContext::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.options),
            self.settings.clone(),
            Arc::clone(&self.classifier),
            Arc::clone(&self.transpiler),
            Arc::clone(&self.compiler),
        );

        for stage in &self.stages {
            let state = stage.state();
            if self.state != state {
                self.state = state;
                self.history.push(state);
            }
            tracing::debug!(stage = stage.name(), %state, "stage");
            ctx = match stage.run(ctx) {
                Ok(ctx) => ctx,
                Err(err) => {
                    self.state = BuildState::Failed;
                    self.history.push(BuildState::Failed);
                    tracing::error!(stage = stage.name(), "build failed: {err}");
                    return Err(err);
                }
            };
        }

        let Some(mut output) = ctx.output.take() else {
            self.enter(BuildState::Failed);
            return Err(Error::InvalidConfig(
                "stage list finished without an emit stage".to_string(),
            ));
        };
        self.enter(BuildState::Done);
        output.states = self.history.clone();
        output.duration = started.elapsed();
        tracing::info!(
            chunks = output.chunks.len(),
            files = output.files.len(),
            elapsed_ms = output.duration.as_millis() as u64,
            "build finished"
        );
        Ok(output)
    }

    fn enter(&mut self, state: BuildState) {
        self.state = state;
        self.history.push(state);
    }
}

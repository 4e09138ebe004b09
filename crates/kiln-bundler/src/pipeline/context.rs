use std::path::PathBuf;
use std::sync::Arc;

use kiln_config::{BuildOptions, GlobalSettings, PathRegistry, PathRole};
use kiln_graph::{AssetReference, Classifier, ModuleGraph, ModuleId};
use rustc_hash::FxHashMap;

use super::BuildOutput;
use crate::chunks::ChunkSet;
use crate::emit::EmissionTable;
use crate::lint::LintReport;
use crate::sprite::SpriteTable;
use crate::transform::{ComponentCompiler, TransformedUnit, Transpiler};

/// State threaded through the stages. Each stage takes the context by
/// value and hands back the context the next stage starts from.
pub struct BuildContext {
    pub registry: Arc<PathRegistry>,
    pub options: Arc<BuildOptions>,
    pub settings: GlobalSettings,
    pub classifier: Arc<Classifier>,
    pub transpiler: Arc<dyn Transpiler>,
    pub compiler: Arc<dyn ComponentCompiler>,

    /// Output filename → file, shared with the transform workers
    pub emissions: Arc<EmissionTable>,
    pub sprite: Arc<SpriteTable>,

    /// Classified files under the source root
    pub inventory: Vec<AssetReference>,
    pub lint: LintReport,
    pub graph: ModuleGraph,
    pub units: FxHashMap<ModuleId, TransformedUnit>,
    pub chunks: ChunkSet,
    /// Set by the emit stage
    pub output: Option<BuildOutput>,
}

impl BuildContext {
    pub fn new(
        registry: Arc<PathRegistry>,
        options: Arc<BuildOptions>,
        settings: GlobalSettings,
        classifier: Arc<Classifier>,
        transpiler: Arc<dyn Transpiler>,
        compiler: Arc<dyn ComponentCompiler>,
    ) -> Self {
        let sprite = Arc::new(SpriteTable::new(options.icons.symbol_id.clone()));
        Self {
            registry,
            options,
            settings,
            classifier,
            transpiler,
            compiler,
            emissions: Arc::new(EmissionTable::new()),
            sprite,
            inventory: Vec::new(),
            lint: LintReport::new(),
            graph: ModuleGraph::new(),
            units: FxHashMap::default(),
            chunks: ChunkSet::default(),
            output: None,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.registry.resolve(PathRole::Build).to_path_buf()
    }
}

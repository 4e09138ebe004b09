use kiln_config::ChunkOptions;
use kiln_graph::{ModuleGraph, ModuleId};
use rustc_hash::{FxHashMap, FxHashSet};

use super::{Chunk, ChunkKind, ChunkRule, ChunkSet, RUNTIME_CHUNK, RUNTIME_MODULE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionOptions {
    /// Targets of dynamic imports start their own chunks
    pub lazy_chunks: bool,
    /// Split the bootstrap into its own chunk instead of the entry chunk
    pub runtime_chunk: bool,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            lazy_chunks: true,
            runtime_chunk: true,
        }
    }
}

impl From<&ChunkOptions> for PartitionOptions {
    fn from(options: &ChunkOptions) -> Self {
        Self {
            lazy_chunks: options.lazy_chunks,
            runtime_chunk: options.runtime_chunk,
        }
    }
}

/// Split `graph` into chunks.
///
/// `rules` must be in evaluation order (see [`ChunkRule::compile_all`]).
/// Every module reachable from the entry lands in exactly one chunk;
/// unreachable modules are dropped. A graph without an entry yields an
/// empty set.
pub fn partition(graph: &ModuleGraph, rules: &[ChunkRule], options: &PartitionOptions) -> ChunkSet {
    let Some(entry) = graph.entry() else {
        return ChunkSet::default();
    };

    let reachable = graph.reachable();
    let reachable_set: FxHashSet<&ModuleId> = reachable.iter().collect();
    let initial: FxHashSet<ModuleId> = graph
        .reachable_from(entry, |d| d.kind.is_eager())
        .into_iter()
        .collect();

    let mut roots = vec![entry.clone()];
    if options.lazy_chunks {
        roots.extend(
            graph
                .lazy_roots()
                .into_iter()
                .filter(|id| !initial.contains(id)),
        );
    }
    let root_set: FxHashSet<&ModuleId> = roots.iter().collect();

    // distinct reachable referrers per module
    let mut reuse: FxHashMap<&ModuleId, usize> = FxHashMap::default();
    for id in &reachable {
        let targets: FxHashSet<&ModuleId> = graph.dependencies(id).map(|d| &d.target).collect();
        for target in targets {
            *reuse.entry(target).or_default() += 1;
        }
    }

    let mut owner: FxHashMap<ModuleId, String> = FxHashMap::default();
    let mut rule_chunks: Vec<Chunk> = rules
        .iter()
        .map(|rule| Chunk::new(rule.chunk_name(), rule.kind()))
        .collect();

    for id in &reachable {
        if root_set.contains(id) {
            continue;
        }
        let Some(module) = graph.get(id) else { continue };
        let count = reuse.get(id).copied().unwrap_or(0);
        let is_initial = initial.contains(id);

        let claimed = rules.iter().position(|rule| {
            rule.matches(module) && rule.in_scope(is_initial) && count >= rule.min_chunks
        });
        if let Some(index) = claimed {
            tracing::trace!(module = %id, rule = %rules[index].name, reuse = count, "claimed");
            rule_chunks[index].modules.push(id.clone());
            owner.insert(id.clone(), rule_chunks[index].name.clone());
        }
    }

    let mut used_names: FxHashSet<String> = rule_chunks.iter().map(|c| c.name.clone()).collect();
    used_names.insert(RUNTIME_CHUNK.to_string());

    let mut root_chunks = Vec::with_capacity(roots.len());
    for (index, root) in roots.iter().enumerate() {
        let kind = if index == 0 { ChunkKind::Entry } else { ChunkKind::Lazy };
        let name = unique_name(&stem(graph, root), &mut used_names);
        let mut chunk = Chunk::new(name, kind);

        let follow_all = !options.lazy_chunks;
        let members = graph.reachable_from(root, |d| {
            (follow_all || d.kind.is_eager()) && (!root_set.contains(&d.target) || &d.target == root)
        });
        for id in members {
            if !owner.contains_key(&id) {
                owner.insert(id.clone(), chunk.name.clone());
                chunk.modules.push(id);
            }
        }
        root_chunks.push(chunk);
    }

    // anything left was only reachable through another root's chunk
    for id in &reachable {
        if !owner.contains_key(id) {
            owner.insert(id.clone(), root_chunks[0].name.clone());
            root_chunks[0].modules.push(id.clone());
        }
    }

    let mut chunks: Vec<Chunk> = rule_chunks.into_iter().filter(|c| !c.modules.is_empty()).collect();
    chunks.extend(root_chunks);

    for chunk in &mut chunks {
        chunk
            .modules
            .sort_by_key(|id| graph.index_of(id).unwrap_or(usize::MAX));
    }

    let runtime = ModuleId::new(RUNTIME_MODULE);
    if options.runtime_chunk {
        let mut chunk = Chunk::new(RUNTIME_CHUNK, ChunkKind::Runtime);
        chunk.modules.push(runtime);
        chunks.push(chunk);
    } else if let Some(entry_chunk) = chunks.iter_mut().find(|c| c.kind == ChunkKind::Entry) {
        entry_chunk.modules.insert(0, runtime);
    }

    debug_assert!(reachable_set.iter().all(|id| owner.contains_key(*id)));
    let set = ChunkSet::from_chunks(chunks);
    tracing::debug!(chunks = set.len(), modules = set.module_count(), "partitioned");
    set
}

fn stem(graph: &ModuleGraph, id: &ModuleId) -> String {
    graph
        .get(id)
        .and_then(|m| m.path.file_stem())
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| "chunk".to_string())
}

fn unique_name(base: &str, used: &mut FxHashSet<String>) -> String {
    let mut name = base.to_string();
    let mut n = 2;
    while used.contains(&name) {
        name = format!("{base}-{n}");
        n += 1;
    }
    used.insert(name.clone());
    name
}

//! Chunk partitioning.
//!
//! Splits the module graph into named chunks: rule chunks claimed by the
//! priority-ordered rule table, one implicit chunk per entry root, and the
//! runtime chunk that carries only the bootstrap.

mod partition;
mod rules;

use std::fmt;

use kiln_graph::ModuleId;
use rustc_hash::FxHashMap;
use serde::Serialize;

pub use partition::{PartitionOptions, partition};
pub use rules::{ChunkRule, RuleTest};

/// Id of the synthetic bootstrap module.
pub const RUNTIME_MODULE: &str = "kiln:runtime";

/// Name of the runtime chunk.
pub const RUNTIME_CHUNK: &str = "runtime";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Runtime,
    /// Claimed by a rule testing the dependency root
    Vendor,
    /// Claimed by any other rule
    Shared,
    Entry,
    /// Rooted at the target of a dynamic import
    Lazy,
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChunkKind::Runtime => "runtime",
            ChunkKind::Vendor => "vendor",
            ChunkKind::Shared => "shared",
            ChunkKind::Entry => "entry",
            ChunkKind::Lazy => "lazy",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub name: String,
    pub kind: ChunkKind,
    /// Members in graph order
    pub modules: Vec<ModuleId>,
}

impl Chunk {
    pub fn new(name: impl Into<String>, kind: ChunkKind) -> Self {
        Self {
            name: name.into(),
            kind,
            modules: Vec::new(),
        }
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.modules.contains(id)
    }

    /// Whether the chunk holds the bootstrap module.
    pub fn has_runtime(&self) -> bool {
        self.modules.iter().any(|m| m.as_str() == RUNTIME_MODULE)
    }
}

/// Partition result. Chunks are kept in load order: runtime, vendor, shared,
/// entry, then lazy chunks in discovery order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChunkSet {
    chunks: Vec<Chunk>,
    #[serde(skip)]
    owners: FxHashMap<ModuleId, usize>,
}

impl ChunkSet {
    pub(crate) fn from_chunks(mut chunks: Vec<Chunk>) -> Self {
        // stable: rule chunks keep evaluation order, lazy chunks discovery order
        chunks.sort_by_key(|c| c.kind);
        let mut owners = FxHashMap::default();
        for (index, chunk) in chunks.iter().enumerate() {
            for id in &chunk.modules {
                owners.insert(id.clone(), index);
            }
        }
        Self { chunks, owners }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.name == name)
    }

    /// The chunk owning `id`.
    pub fn chunk_of(&self, id: &ModuleId) -> Option<&Chunk> {
        self.owners.get(id).map(|&index| &self.chunks[index])
    }

    pub fn entry(&self) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.kind == ChunkKind::Entry)
    }

    pub fn runtime(&self) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.kind == ChunkKind::Runtime)
    }

    /// Chunk names in script load order.
    pub fn load_order(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.name.as_str()).collect()
    }

    /// Every application or library module, across all chunks.
    pub fn module_count(&self) -> usize {
        self.owners
            .keys()
            .filter(|id| id.as_str() != RUNTIME_MODULE)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_sort_into_load_order() {
        let mut entry = Chunk::new("main", ChunkKind::Entry);
        entry.modules.push("src/main.js".into());
        let mut lazy = Chunk::new("Page", ChunkKind::Lazy);
        lazy.modules.push("src/Page.vue".into());
        let mut runtime = Chunk::new(RUNTIME_CHUNK, ChunkKind::Runtime);
        runtime.modules.push(RUNTIME_MODULE.into());
        let shared = Chunk::new("chunk-commons", ChunkKind::Shared);
        let vendor = Chunk::new("chunk-libs", ChunkKind::Vendor);

        let set = ChunkSet::from_chunks(vec![entry, lazy, shared, runtime, vendor]);
        assert_eq!(
            set.load_order(),
            ["runtime", "chunk-libs", "chunk-commons", "main", "Page"]
        );
        assert_eq!(set.chunk_of(&"src/Page.vue".into()).unwrap().name, "Page");
        assert!(set.runtime().unwrap().has_runtime());
        assert_eq!(set.module_count(), 2);
    }
}

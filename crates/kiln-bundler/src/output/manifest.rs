use serde::Serialize;

use crate::Result;
use crate::chunks::{ChunkKind, ChunkSet};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestChunk {
    pub name: String,
    pub kind: ChunkKind,
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub css: Option<String>,
    pub modules: Vec<String>,
}

/// Machine-readable summary of one build's output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    /// The entry document
    pub entry: String,
    /// In script load order
    pub chunks: Vec<ManifestChunk>,
    /// Every other emitted file
    pub assets: Vec<String>,
}

impl Manifest {
    /// Build the manifest from the chunk set and the filenames each chunk
    /// was written to.
    pub fn new(
        entry: impl Into<String>,
        chunks: &ChunkSet,
        file_of: impl Fn(&str) -> Option<String>,
        css_of: impl Fn(&str) -> Option<String>,
        assets: Vec<String>,
    ) -> Self {
        let chunks = chunks
            .iter()
            .filter_map(|chunk| {
                Some(ManifestChunk {
                    name: chunk.name.clone(),
                    kind: chunk.kind,
                    file: file_of(&chunk.name)?,
                    css: css_of(&chunk.name),
                    modules: chunk.modules.iter().map(|m| m.as_str().to_string()).collect(),
                })
            })
            .collect();
        Self {
            entry: entry.into(),
            chunks,
            assets,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

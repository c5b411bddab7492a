//! Embedding chunk entity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Semantic section of a manifest a chunk was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    /// Name, description, base library, Radix docs URL
    Description,
    /// Import statements
    Import,
    /// Categorized prop groups
    Props,
    /// Compound sub-component shape
    Composition,
    /// Usage examples
    Examples,
    /// Patterns, related components, dependency summary
    Patterns,
    /// When-to-use / when-not-to-use / accessibility guidance
    Guidance,
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Description => "description",
            Self::Import => "import",
            Self::Props => "props",
            Self::Composition => "composition",
            Self::Examples => "examples",
            Self::Patterns => "patterns",
            Self::Guidance => "guidance",
        };
        f.write_str(s)
    }
}

/// An embedded slice of a component manifest.
///
/// Chunks belong to a component and its org; deleting the component deletes
/// its chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingChunk {
    /// Stable identifier
    pub id: Uuid,
    /// Owning organization
    pub org_id: Uuid,
    /// Owning component
    pub component_id: Uuid,
    /// Manifest section this chunk came from
    pub chunk_type: ChunkType,
    /// Chunk text, at most 4000 characters
    pub content: String,
    /// Sequence within the chunk type
    pub chunk_index: u32,
    /// Dense vector, fixed dimensionality per deployment
    pub embedding: Vec<f32>,
}

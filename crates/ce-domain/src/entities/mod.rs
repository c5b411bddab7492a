//! Persisted business entities

mod api_key;
mod chunk;
mod component;
mod organization;

pub use api_key::ApiKey;
pub use chunk::{ChunkType, EmbeddingChunk};
pub use component::{Component, EmbeddingModelInfo, EmbeddingStatus, Framework, Visibility};
pub use organization::Organization;

//! Embedding providers

mod null;
mod voyage;

pub use null::NullEmbeddingProvider;
pub use voyage::VoyageEmbeddingProvider;

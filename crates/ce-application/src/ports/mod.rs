//! Capability port interfaces
//!
//! External collaborators are reached only through these traits. Concrete
//! adapters live in `ce-providers`; tests substitute their own.

mod embedding;
mod extractor;
mod generator;
mod storage;

pub use embedding::EmbeddingProvider;
pub use extractor::{AnalyzedProp, ComponentExtractor, ExtractionOutcome, ExtractionRequest,
    PropsAnalyzer};
pub use generator::{GenerationOutcome, GenerationRequest, MetaGenerator, TokenUsage, ToolSpec};
pub use storage::{
    ApiKeyStore, ComponentPage, ComponentQuery, ComponentStore, ComponentUpsert, ChunkStore,
    EmbeddingStatusCounts, KeywordSearchOptions, ManifestFilter, OrderBy, OrderDir,
    OrganizationStore, SemanticSearchOptions,
};

//! Pipeline and retrieval services

/// Tenant/platform token validation and key issuance
pub mod auth;
/// Manifest chunking for embedding
pub mod chunking;
/// LLM metadata generation: prompt, tool schema, output validation
pub mod generation;
/// Manifest assembly from extraction + generation
pub mod manifest;
/// Extract / generate / build orchestration
pub mod processing;
/// Background embedding reconciliation
pub mod reconciler;
/// Keyword / semantic / hybrid search
pub mod search;

pub use auth::{AuthService, IssuedKey};
pub use chunking::{ManifestChunk, chunk_manifest};
pub use generation::{GeneratedMeta, GenerationLimits, GenerationService};
pub use manifest::{ManifestIdentity, build_manifest};
pub use processing::{
    BuildResult, ExtractInput, ExtractResult, GenerateResult, ProcessingService,
};
pub use reconciler::{BatchReport, MigrateReport, ReconcilerConfig, ReconcilerService};
pub use search::{IndexStats, SearchRequest, SearchService};

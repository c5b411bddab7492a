//! Storage layer ports
//!
//! Row-level multi-tenant relational store: every component and chunk carries
//! an `org_id` and every operation filters on it. The reference PostgreSQL +
//! pgvector deployment is an external collaborator; these traits record the
//! capabilities it must provide — a generated weighted full-text vector over
//! `(name, manifest.description)` with a GIN index, a cosine ANN index over
//! chunk embeddings (HNSW, m=16 / ef_construction=64 in the reference), a
//! unique index on `(org_id, slug)`, and an atomic compare-and-set on the
//! embedding status column.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use ce_domain::Result;
use ce_domain::entities::{
    ApiKey, Component, EmbeddingChunk, EmbeddingModelInfo, EmbeddingStatus, Framework,
    Organization, Visibility,
};
use ce_domain::value_objects::{
    AiManifest, ComponentMeta, ExtractedData, ExtractionDiagnostics, SearchHit,
};

/// Sort key for component listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderBy {
    /// Component name (default)
    #[default]
    Name,
    /// Creation timestamp
    CreatedAt,
    /// Last update timestamp
    UpdatedAt,
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDir {
    /// Ascending (default)
    #[default]
    Asc,
    /// Descending
    Desc,
}

/// Filterable component listing query
#[derive(Debug, Clone, Default)]
pub struct ComponentQuery {
    /// Restrict to a framework
    pub framework: Option<Framework>,
    /// Restrict to a visibility level
    pub visibility: Option<Visibility>,
    /// Restrict to an embedding status
    pub embedding_status: Option<EmbeddingStatus>,
    /// Page size (callers clamp to 100)
    pub limit: usize,
    /// Page offset
    pub offset: usize,
    /// Sort key
    pub order_by: OrderBy,
    /// Sort direction
    pub order: OrderDir,
}

/// One page of components plus the unpaged total
#[derive(Debug, Clone)]
pub struct ComponentPage {
    /// Page items
    pub items: Vec<Component>,
    /// Total rows matching the filters
    pub total: usize,
}

/// Filter for bulk manifest reads
#[derive(Debug, Clone, Default)]
pub struct ManifestFilter {
    /// Restrict to these slugs
    pub slugs: Option<Vec<String>>,
    /// Restrict to a framework
    pub framework: Option<Framework>,
    /// Maximum rows (callers clamp to 100)
    pub limit: usize,
}

/// Fields written by the extract phase, keyed by `(org_id, slug)`
#[derive(Debug, Clone)]
pub struct ComponentUpsert {
    /// Update this row instead of resolving by slug, when provided
    pub id: Option<Uuid>,
    /// Per-org unique slug
    pub slug: String,
    /// Display name
    pub name: String,
    /// Authoring framework
    pub framework: Framework,
    /// Optional library version
    pub version: Option<String>,
    /// Visibility, defaulting to private on insert
    pub visibility: Option<Visibility>,
    /// Source digest
    pub source_hash: String,
    /// Extraction payload
    pub extraction: ExtractedData,
    /// Extraction diagnostics
    pub extraction_diagnostics: ExtractionDiagnostics,
}

/// Per-status component counts; statuses with no rows are zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct EmbeddingStatusCounts {
    /// Rows waiting for indexing
    pub pending: usize,
    /// Rows claimed by a worker
    pub processing: usize,
    /// Fully indexed rows
    pub indexed: usize,
    /// Rows whose last attempt failed
    pub failed: usize,
}

impl EmbeddingStatusCounts {
    /// Sum across all statuses
    pub fn total(&self) -> usize {
        self.pending + self.processing + self.indexed + self.failed
    }
}

/// Keyword search options
#[derive(Debug, Clone, Copy)]
pub struct KeywordSearchOptions {
    /// Maximum hits
    pub limit: usize,
    /// Minimum rank score
    pub min_score: f64,
    /// Restrict to a framework
    pub framework: Option<Framework>,
}

impl Default for KeywordSearchOptions {
    fn default() -> Self {
        Self {
            limit: ce_domain::constants::DEFAULT_SEARCH_LIMIT,
            min_score: 0.0,
            framework: None,
        }
    }
}

/// Semantic search options
#[derive(Debug, Clone, Copy)]
pub struct SemanticSearchOptions {
    /// Maximum components returned after aggregation
    pub limit: usize,
    /// Minimum cosine similarity
    pub min_score: f64,
    /// Restrict to a framework
    pub framework: Option<Framework>,
}

impl Default for SemanticSearchOptions {
    fn default() -> Self {
        Self {
            limit: ce_domain::constants::DEFAULT_SEARCH_LIMIT,
            min_score: ce_domain::constants::DEFAULT_MIN_SEMANTIC_SCORE,
            framework: None,
        }
    }
}

/// Organization CRUD
#[async_trait]
pub trait OrganizationStore: Send + Sync {
    /// Create an organization
    async fn create_org(&self, name: &str) -> Result<Organization>;

    /// Find an organization by id
    async fn find_org_by_id(&self, id: Uuid) -> Result<Option<Organization>>;

    /// List organizations with paging; returns the page and the total
    async fn list_orgs(&self, limit: usize, offset: usize) -> Result<(Vec<Organization>, usize)>;

    /// Rename an organization
    async fn update_org(&self, id: Uuid, name: &str) -> Result<Organization>;

    /// Delete an organization. Fails with a conflict while components
    /// reference it.
    async fn delete_org(&self, id: Uuid) -> Result<()>;
}

/// API key persistence
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Insert a key record. At most one row per digest; duplicates conflict.
    async fn insert_api_key(&self, key: ApiKey) -> Result<ApiKey>;

    /// Look up a key by its digest
    async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>>;

    /// List keys of an org (digests included; raw keys are never stored)
    async fn list_api_keys(&self, org_id: Uuid) -> Result<Vec<ApiKey>>;

    /// Deactivate a key
    async fn revoke_api_key(&self, org_id: Uuid, key_id: Uuid) -> Result<()>;
}

/// Component persistence and search
#[async_trait]
pub trait ComponentStore: Send + Sync {
    /// Create or update a component keyed by `(org_id, slug)` — or by id when
    /// the upsert carries one. Returns the stored row and whether it was
    /// created.
    async fn upsert_component(
        &self,
        org_id: Uuid,
        data: ComponentUpsert,
    ) -> Result<(Component, bool)>;

    /// Find by id, org-scoped
    async fn find_component_by_id(&self, org_id: Uuid, id: Uuid) -> Result<Option<Component>>;

    /// Find by slug, org-scoped
    async fn find_component_by_slug(&self, org_id: Uuid, slug: &str)
    -> Result<Option<Component>>;

    /// Find by name, case-insensitive, org-scoped
    async fn find_component_by_name(&self, org_id: Uuid, name: &str)
    -> Result<Option<Component>>;

    /// Filtered, ordered, paged listing with total
    async fn find_many(&self, org_id: Uuid, query: ComponentQuery) -> Result<ComponentPage>;

    /// Components that have manifests, optionally filtered
    async fn find_all_manifests(
        &self,
        org_id: Uuid,
        filter: ManifestFilter,
    ) -> Result<Vec<Component>>;

    /// All component names of an org
    async fn find_all_names(&self, org_id: Uuid) -> Result<Vec<String>>;

    /// Partial update of mutable listing fields
    async fn update_component(
        &self,
        org_id: Uuid,
        id: Uuid,
        name: Option<String>,
        version: Option<String>,
        visibility: Option<Visibility>,
    ) -> Result<Component>;

    /// Write the generation payload with its provider/model annotations
    async fn set_generation(
        &self,
        org_id: Uuid,
        id: Uuid,
        generation: ComponentMeta,
        provider: &str,
        model: &str,
    ) -> Result<Component>;

    /// Write the manifest. When the manifest differs from the stored one the
    /// row's embedding status resets to pending and its error clears.
    async fn set_manifest(&self, org_id: Uuid, id: Uuid, manifest: AiManifest)
    -> Result<Component>;

    /// Delete the component; its chunks cascade
    async fn delete_component(&self, org_id: Uuid, id: Uuid) -> Result<()>;

    /// Per-status counts, missing statuses zero
    async fn count_by_embedding_status(&self, org_id: Uuid) -> Result<EmbeddingStatusCounts>;

    /// Pending rows of one org, oldest `updated_at` first
    async fn find_pending(&self, org_id: Uuid, limit: usize) -> Result<Vec<Component>>;

    /// Round-robin interleaving of pending rows across every org that has at
    /// least one pending row with a non-null manifest; no org exceeds
    /// `max_per_org`.
    async fn find_all_pending_fair(
        &self,
        limit: usize,
        max_per_org: usize,
    ) -> Result<Vec<Component>>;

    /// Atomically claim a row: `pending -> processing`, clearing the error
    /// and stamping the claim time. Returns false when another worker won.
    async fn claim_for_processing(&self, org_id: Uuid, id: Uuid) -> Result<bool>;

    /// Mark a row indexed with the model that produced its chunks
    async fn mark_indexed(&self, org_id: Uuid, id: Uuid, model: EmbeddingModelInfo) -> Result<()>;

    /// Mark a row failed with the error message
    async fn mark_failed(&self, org_id: Uuid, id: Uuid, error: &str) -> Result<()>;

    /// Return a row to pending (manual requeue / migration)
    async fn mark_pending(&self, org_id: Uuid, id: Uuid) -> Result<()>;

    /// Reset every failed row of an org to pending; returns the count
    async fn reset_failed_to_pending(&self, org_id: Uuid) -> Result<usize>;

    /// Return `processing` rows claimed before `now - older_than` to pending
    /// across all orgs; returns the count. Crash-recovery sweep.
    async fn reset_stale_processing(&self, older_than: Duration) -> Result<usize>;

    /// Indexed rows whose stored embedding model differs from `current_model`
    async fn find_by_outdated_model(
        &self,
        org_id: Uuid,
        current_model: &str,
        limit: usize,
    ) -> Result<Vec<Component>>;

    /// Weighted full-text search over name (weight A) and manifest
    /// description (weight B), length-normalized; indexed rows only. An empty
    /// query yields no hits.
    async fn search_keyword(
        &self,
        org_id: Uuid,
        query: &str,
        options: KeywordSearchOptions,
    ) -> Result<Vec<SearchHit>>;
}

/// Embedding chunk persistence and ANN search
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Delete every chunk of a component
    async fn delete_chunks(&self, org_id: Uuid, component_id: Uuid) -> Result<()>;

    /// Insert chunk rows; returns the inserted count
    async fn insert_chunks(&self, chunks: Vec<EmbeddingChunk>) -> Result<usize>;

    /// Total chunks of an org
    async fn count_chunks(&self, org_id: Uuid) -> Result<usize>;

    /// Chunk counts of an org grouped by chunk type
    async fn count_chunks_by_type(&self, org_id: Uuid) -> Result<BTreeMap<String, usize>>;

    /// Chunks of a component, ordered by type then index
    async fn find_chunks(&self, org_id: Uuid, component_id: Uuid) -> Result<Vec<EmbeddingChunk>>;

    /// Cosine ANN over chunk embeddings: over-fetches `3 * limit` chunks
    /// ordered by distance, aggregates per component by maximum similarity
    /// (`1 - distance`), applies the similarity floor and returns the top
    /// `limit` components.
    async fn search_semantic(
        &self,
        org_id: Uuid,
        query_vector: &[f32],
        options: SemanticSearchOptions,
    ) -> Result<Vec<SearchHit>>;
}

//! Pipeline orchestration: extract, generate, build
//!
//! Each operation is atomic from the caller's perspective: load the row, run
//! the matching stage, write back. Ordering within a component id is
//! serialized by the storage layer's read-modify-write on the row.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ce_domain::entities::{Component, Framework};
use ce_domain::identity::{new_component_id, slug_for, source_hash};
use ce_domain::value_objects::{AiManifest, ComponentMeta, ExtractedData, ExtractionDiagnostics};
use ce_domain::{Error, Result};

use crate::ports::{
    ChunkStore, ComponentExtractor, ComponentStore, ComponentUpsert, ExtractionRequest,
};
use crate::services::generation::GenerationService;
use crate::services::manifest::{ManifestIdentity, build_manifest};

/// Input to the extract operation
#[derive(Debug, Clone)]
pub struct ExtractInput {
    /// Component source text
    pub source_code: String,
    /// Component name
    pub name: String,
    /// Authoring framework (react unless stated)
    pub framework: Framework,
    /// Path of the source file
    pub file_path: Option<String>,
    /// Optional library version
    pub version: Option<String>,
    /// Re-extract into an existing row instead of resolving by slug
    pub existing_id: Option<Uuid>,
    /// Optional Storybook stories source
    pub stories_code: Option<String>,
    /// Path of the stories file
    pub stories_file_path: Option<String>,
}

/// Result of the extract operation
#[derive(Debug, Clone)]
pub struct ExtractResult {
    /// The component row id
    pub component_id: Uuid,
    /// The component slug
    pub slug: String,
    /// Component name
    pub name: String,
    /// Authoring framework
    pub framework: Framework,
    /// Digest of the submitted source
    pub source_hash: String,
    /// Structural payload
    pub extraction: ExtractedData,
    /// Extraction diagnostics
    pub metadata: ExtractionDiagnostics,
    /// Whether the row was created (as opposed to updated)
    pub created: bool,
}

/// Result of the generate operation
#[derive(Debug, Clone)]
pub struct GenerateResult {
    /// The component row id
    pub component_id: Uuid,
    /// Generated metadata payload
    pub generation: ComponentMeta,
    /// Provider that answered
    pub provider: String,
    /// Model that answered
    pub model: String,
}

/// Result of the build operation
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// The component row id
    pub component_id: Uuid,
    /// Component name
    pub name: String,
    /// The merged manifest
    pub manifest: AiManifest,
    /// Digest of the source the manifest was built from
    pub source_hash: String,
    /// When the build completed
    pub built_at: DateTime<Utc>,
}

/// Thin orchestrator over the three pipeline stages
pub struct ProcessingService {
    components: Arc<dyn ComponentStore>,
    chunks: Arc<dyn ChunkStore>,
    extractor: Arc<dyn ComponentExtractor>,
    generation: Arc<GenerationService>,
    default_package: String,
}

impl ProcessingService {
    /// Create the service with its injected collaborators
    pub fn new(
        components: Arc<dyn ComponentStore>,
        chunks: Arc<dyn ChunkStore>,
        extractor: Arc<dyn ComponentExtractor>,
        generation: Arc<GenerationService>,
        default_package: String,
    ) -> Self {
        Self {
            components,
            chunks,
            extractor,
            generation,
            default_package,
        }
    }

    /// Extract structural data and upsert the component row.
    ///
    /// A re-extract moves the row back to the first pipeline phase: the
    /// embedding status resets to pending and existing chunks are dropped.
    pub async fn extract(&self, org_id: Uuid, input: ExtractInput) -> Result<ExtractResult> {
        if input.name.trim().is_empty() {
            return Err(Error::validation("component name must not be empty"));
        }

        let request = ExtractionRequest {
            name: input.name.clone(),
            source_code: input.source_code.clone(),
            stories_code: input.stories_code.clone(),
            framework: input.framework,
            file_path: input.file_path.clone(),
            stories_file_path: input.stories_file_path.clone(),
            ..ExtractionRequest::new(&input.name, "")
        };
        let outcome = self.extractor.extract(request).await?;

        let id = match input.existing_id {
            Some(id) => {
                // Updating by id requires the row to exist in this org
                self.components
                    .find_component_by_id(org_id, id)
                    .await?
                    .ok_or_else(|| Error::not_found(format!("component {id}")))?;
                id
            }
            None => {
                // The slug embeds the id, so a re-extract of a known
                // component must reuse its id for the upsert key to match
                match self
                    .components
                    .find_component_by_name(org_id, &input.name)
                    .await?
                {
                    Some(existing) if existing.framework == input.framework => existing.id,
                    _ => new_component_id(),
                }
            }
        };
        let slug = slug_for(&input.name, input.framework, id);
        let hash = source_hash(&input.source_code);

        let (component, created) = self
            .components
            .upsert_component(
                org_id,
                ComponentUpsert {
                    id: input.existing_id,
                    slug: slug.clone(),
                    name: input.name.clone(),
                    framework: input.framework,
                    version: input.version.clone(),
                    visibility: None,
                    source_hash: hash,
                    extraction: outcome.data.clone(),
                    extraction_diagnostics: outcome.diagnostics,
                },
            )
            .await?;

        // Downstream chunks are stale the moment a new extraction lands
        self.chunks.delete_chunks(org_id, component.id).await?;

        tracing::info!(
            org_id = %org_id,
            component_id = %component.id,
            slug = %component.slug,
            method = ?outcome.diagnostics.method,
            "extraction stored"
        );

        Ok(ExtractResult {
            component_id: component.id,
            slug: component.slug,
            name: component.name,
            framework: component.framework,
            source_hash: component.source_hash,
            extraction: outcome.data,
            metadata: outcome.diagnostics,
            created,
        })
    }

    /// Generate semantic metadata for an extracted component
    pub async fn generate(
        &self,
        org_id: Uuid,
        component_id: Uuid,
        hints: Option<&str>,
    ) -> Result<GenerateResult> {
        let component = self.require_component(org_id, component_id).await?;
        let extraction = component
            .extraction
            .as_ref()
            .ok_or_else(|| Error::validation("component has no extraction; run extract first"))?;

        let generated = self
            .generation
            .generate(&component.name, extraction, hints)
            .await?;

        self.components
            .set_generation(
                org_id,
                component_id,
                generated.meta.clone(),
                &generated.provider,
                &generated.model,
            )
            .await?;

        tracing::info!(
            org_id = %org_id,
            component_id = %component_id,
            provider = %generated.provider,
            model = %generated.model,
            "generation stored"
        );

        Ok(GenerateResult {
            component_id,
            generation: generated.meta,
            provider: generated.provider,
            model: generated.model,
        })
    }

    /// Merge extraction and generation into the canonical manifest.
    ///
    /// Writing a changed manifest resets the row's embedding status to
    /// pending and clears any previous embedding error.
    pub async fn build(&self, org_id: Uuid, component_id: Uuid) -> Result<BuildResult> {
        let component = self.require_component(org_id, component_id).await?;
        let extraction = component
            .extraction
            .as_ref()
            .ok_or_else(|| Error::validation("component has no extraction; run extract first"))?;
        let generation = component
            .generation
            .as_ref()
            .ok_or_else(|| Error::validation("component has no generation; run generate first"))?;

        let available = self.components.find_all_names(org_id).await?;
        let identity = ManifestIdentity {
            name: &component.name,
            slug: &component.slug,
            default_package: &self.default_package,
        };
        let manifest = build_manifest(&identity, extraction, generation, Some(&available));

        let stored = self
            .components
            .set_manifest(org_id, component_id, manifest.clone())
            .await?;

        tracing::info!(
            org_id = %org_id,
            component_id = %component_id,
            embedding_status = %stored.embedding_status,
            "manifest stored"
        );

        Ok(BuildResult {
            component_id,
            name: stored.name,
            manifest,
            source_hash: stored.source_hash,
            built_at: stored.updated_at,
        })
    }

    async fn require_component(&self, org_id: Uuid, id: Uuid) -> Result<Component> {
        self.components
            .find_component_by_id(org_id, id)
            .await?
            .ok_or_else(|| Error::not_found(format!("component {id}")))
    }
}

//! End-to-end pipeline tests
//!
//! Drive extract -> generate -> build -> reconcile -> search across the real
//! extractor and the in-memory backend, with deterministic stand-ins for the
//! LLM and embedding providers.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use ce_application::ports::{
    EmbeddingProvider, GenerationOutcome, GenerationRequest, MetaGenerator,
};
use ce_application::services::{
    ExtractInput, GenerationLimits, GenerationService, ProcessingService, ReconcilerConfig,
    ReconcilerService, SearchRequest, SearchService,
};
use ce_domain::Result;
use ce_domain::entities::{EmbeddingModelInfo, EmbeddingStatus, Framework};
use ce_domain::value_objects::{ExtractionMethod, SearchMode};
use ce_providers::extractor::TsxExtractor;
use ce_providers::storage::MemoryStore;

const DIMENSIONS: usize = 8;

/// Deterministic embedding: a bag-of-words projection over a tiny vocabulary,
/// so related texts land near each other and tests stay reproducible.
struct VocabEmbedding;

const VOCAB: [&str; 8] = [
    "button", "action", "dialog", "modal", "overlay", "input", "form", "alert",
];

#[async_trait]
impl EmbeddingProvider for VocabEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let lowered = text.to_lowercase();
                let mut vector = vec![0.0f32; DIMENSIONS];
                for (i, word) in VOCAB.iter().enumerate() {
                    vector[i] = lowered.matches(word).count() as f32;
                }
                // Keep zero vectors representable
                if vector.iter().all(|v| *v == 0.0) {
                    vector[DIMENSIONS - 1] = 0.001;
                }
                vector
            })
            .collect())
    }

    fn model_info(&self) -> EmbeddingModelInfo {
        EmbeddingModelInfo {
            provider: "test".to_string(),
            model: "vocab-1".to_string(),
            dimensions: DIMENSIONS,
        }
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

/// Canned LLM that answers the metadata tool with a fixed payload
struct CannedGenerator;

#[async_trait]
impl MetaGenerator for CannedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutcome> {
        // The prompt always names the component first
        let name = request
            .prompt
            .lines()
            .next()
            .and_then(|line| line.strip_prefix("Component: "))
            .unwrap_or("Component")
            .to_string();
        Ok(GenerationOutcome {
            data: serde_json::json!({
                "description": format!(
                    "{name} is a reusable interface element used across product surfaces."
                ),
                "guidance": {
                    "whenToUse": format!("Reach for {name} in everyday flows."),
                    "whenNotToUse": "When a plain HTML element is enough.",
                    "accessibility": "Keyboard and screen-reader friendly.",
                    "patterns": ["interactive-control"],
                    "relatedComponents": []
                }
            }),
            usage: None,
            model: "canned-1".to_string(),
        })
    }

    fn provider_name(&self) -> &str {
        "test"
    }

    fn model(&self) -> &str {
        "canned-1"
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    processing: ProcessingService,
    reconciler: ReconcilerService,
    search: SearchService,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let embeddings = Arc::new(VocabEmbedding);
    let generation = Arc::new(GenerationService::new(
        Arc::new(CannedGenerator),
        GenerationLimits::default(),
    ));

    let processing = ProcessingService::new(
        store.clone(),
        store.clone(),
        Arc::new(TsxExtractor::new()),
        generation,
        "@acme/ui".to_string(),
    );
    let reconciler = ReconcilerService::new(
        store.clone(),
        store.clone(),
        embeddings.clone(),
        ReconcilerConfig::default(),
    );
    let search = SearchService::new(store.clone(), store.clone(), embeddings);

    Harness {
        store,
        processing,
        reconciler,
        search,
    }
}

const BUTTON_SOURCE: &str = r#"
import * as React from "react"
import { cva } from "class-variance-authority"

const buttonVariants = cva("inline-flex", {
  variants: {
    variant: { default: "bg-primary", destructive: "bg-destructive" },
    size: { sm: "h-8", lg: "h-10" },
  },
  defaultVariants: { variant: "default", size: "sm" },
})

export interface ButtonProps {
  variant?: "default" | "destructive"
  size?: "sm" | "lg"
  disabled?: boolean
  children?: React.ReactNode
}

const Button = React.forwardRef<HTMLButtonElement, ButtonProps>(
  ({ variant, size, disabled = false, children }, ref) => (
    <button className={buttonVariants({ variant, size })} ref={ref} disabled={disabled}>
      {children}
    </button>
  )
)
export { Button, buttonVariants }
"#;

async fn ingest(harness: &Harness, org: Uuid, name: &str, source: &str) -> Uuid {
    let extracted = harness
        .processing
        .extract(
            org,
            ExtractInput {
                source_code: source.to_string(),
                name: name.to_string(),
                framework: Framework::React,
                file_path: Some(format!("src/{}.tsx", name.to_lowercase())),
                version: None,
                existing_id: None,
                stories_code: None,
                stories_file_path: None,
            },
        )
        .await
        .unwrap();
    harness
        .processing
        .generate(org, extracted.component_id, None)
        .await
        .unwrap();
    harness
        .processing
        .build(org, extracted.component_id)
        .await
        .unwrap();
    extracted.component_id
}

#[tokio::test]
async fn full_pipeline_reaches_indexed_and_searchable() {
    let harness = harness();
    let org = Uuid::new_v4();

    let id = ingest(&harness, org, "Button", BUTTON_SOURCE).await;

    use ce_application::ports::ComponentStore;
    let row = harness
        .store
        .find_component_by_id(org, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.embedding_status, EmbeddingStatus::Pending);
    assert_eq!(
        row.extraction_diagnostics.unwrap().method,
        ExtractionMethod::Primary
    );
    let manifest = row.manifest.clone().unwrap();
    assert!(manifest.props.is_some());
    assert_eq!(manifest.slug, row.slug);

    // Reconcile: pending -> indexed with chunks
    let report = harness.reconciler.process_pending(org, 10).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);

    let row = harness
        .store
        .find_component_by_id(org, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.embedding_status, EmbeddingStatus::Indexed);
    assert_eq!(row.embedding_model.unwrap().model, "vocab-1");

    use ce_application::ports::ChunkStore;
    assert!(harness.store.count_chunks(org).await.unwrap() > 0);

    // Keyword search hits the freshly indexed component
    let outcome = harness
        .search
        .search(
            org,
            SearchRequest {
                query: "button".to_string(),
                mode: SearchMode::Keyword,
                limit: 10,
                framework: None,
                min_score: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.results[0].name, "Button");

    // Hybrid search fuses both signals and reports both counts
    let outcome = harness
        .search
        .search(org, SearchRequest::new("button action"))
        .await
        .unwrap();
    assert_eq!(outcome.meta.search_mode, SearchMode::Hybrid);
    assert!(outcome.meta.keyword_count.is_some());
    assert!(outcome.meta.semantic_count.is_some());
}

#[tokio::test]
async fn rebuild_with_identical_inputs_is_idempotent() {
    let harness = harness();
    let org = Uuid::new_v4();

    let id = ingest(&harness, org, "Button", BUTTON_SOURCE).await;

    use ce_application::ports::ComponentStore;
    let first = harness
        .store
        .find_component_by_id(org, id)
        .await
        .unwrap()
        .unwrap();

    // Same source through the whole pipeline again
    let re_extracted = harness
        .processing
        .extract(
            org,
            ExtractInput {
                source_code: BUTTON_SOURCE.to_string(),
                name: "Button".to_string(),
                framework: Framework::React,
                file_path: Some("src/button.tsx".to_string()),
                version: None,
                existing_id: None,
                stories_code: None,
                stories_file_path: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(re_extracted.component_id, id);
    harness.processing.generate(org, id, None).await.unwrap();
    harness.processing.build(org, id).await.unwrap();

    let second = harness
        .store
        .find_component_by_id(org, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.source_hash, second.source_hash);
    assert_eq!(first.extraction, second.extraction);
    assert_eq!(first.manifest, second.manifest);
}

#[tokio::test]
async fn generate_requires_extraction_and_build_requires_both() {
    let harness = harness();
    let org = Uuid::new_v4();
    let missing = Uuid::new_v4();

    let err = harness
        .processing
        .generate(org, missing, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    let extracted = harness
        .processing
        .extract(
            org,
            ExtractInput {
                source_code: BUTTON_SOURCE.to_string(),
                name: "Button".to_string(),
                framework: Framework::React,
                file_path: None,
                version: None,
                existing_id: None,
                stories_code: None,
                stories_file_path: None,
            },
        )
        .await
        .unwrap();

    // Build without generation is a validation failure
    let err = harness
        .processing
        .build(org, extracted.component_id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn reconciler_tick_respects_the_fair_share() {
    let harness = harness();
    let org1 = Uuid::new_v4();
    let org2 = Uuid::new_v4();

    for i in 0..12 {
        ingest(&harness, org1, &format!("Widget{i}"), BUTTON_SOURCE).await;
    }
    ingest(&harness, org2, "Dialog", BUTTON_SOURCE).await;

    // Small batch with a per-org cap of one
    let reconciler = ReconcilerService::new(
        harness.store.clone(),
        harness.store.clone(),
        Arc::new(VocabEmbedding),
        ReconcilerConfig {
            batch_size: 2,
            max_per_org: Some(1),
            ..ReconcilerConfig::default()
        },
    );
    let report = reconciler.tick().await.unwrap();
    assert!(report.processed <= 2);

    use ce_application::ports::ComponentStore;
    let counts1 = harness.store.count_by_embedding_status(org1).await.unwrap();
    let counts2 = harness.store.count_by_embedding_status(org2).await.unwrap();
    assert!(counts1.indexed <= 1, "org1 exceeded its share: {counts1:?}");
    assert!(counts2.indexed <= 1, "org2 exceeded its share: {counts2:?}");
    assert_eq!(counts1.indexed + counts2.indexed, report.succeeded);
}

#[tokio::test]
async fn find_similar_excludes_the_component_itself() {
    let harness = harness();
    let org = Uuid::new_v4();

    let button = ingest(&harness, org, "Button", BUTTON_SOURCE).await;
    ingest(&harness, org, "IconButton", BUTTON_SOURCE).await;
    harness.reconciler.process_pending(org, 10).await.unwrap();

    use ce_application::ports::ComponentStore;
    let slug = harness
        .store
        .find_component_by_id(org, button)
        .await
        .unwrap()
        .unwrap()
        .slug;

    let similar = harness
        .search
        .find_similar(org, &slug, 5, Some(0.1), None)
        .await
        .unwrap();
    assert!(similar.iter().all(|hit| hit.component_id != button));
    assert!(similar.iter().any(|hit| hit.name == "IconButton"));
}

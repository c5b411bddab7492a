//! Background embedding reconciliation
//!
//! One reconciler task group per process. The loop pulls pending rows with a
//! fair cross-tenant share, claims each row with a compare-and-set status
//! transition, rebuilds its chunks, embeds them in one batch and stores the
//! result. Failures mark the row failed; the next manifest write or a manual
//! retry returns it to pending. A stale sweep returns rows abandoned by
//! crashed workers to pending.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use uuid::Uuid;

use ce_domain::constants::FAIR_SHARE_DIVISOR;
use ce_domain::entities::{Component, EmbeddingChunk};
use ce_domain::{Error, Result};

use crate::ports::{ChunkStore, ComponentStore, EmbeddingProvider};
use crate::services::chunking::chunk_manifest;

/// Reconciler tuning knobs
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Rows pulled per tick
    pub batch_size: usize,
    /// Per-org cap within a batch; `None` derives `ceil(batch_size / 10)`
    pub max_per_org: Option<usize>,
    /// Rows indexed concurrently
    pub concurrency: usize,
    /// Seconds between ticks
    pub interval_secs: u64,
    /// Age after which a `processing` row is considered abandoned
    pub stale_after_secs: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_per_org: None,
            concurrency: 4,
            interval_secs: 30,
            stale_after_secs: 600,
        }
    }
}

impl ReconcilerConfig {
    /// Effective per-org cap for a batch of `limit`
    pub fn fair_share(&self, limit: usize) -> usize {
        self.max_per_org
            .unwrap_or_else(|| limit.div_ceil(FAIR_SHARE_DIVISOR))
            .max(1)
    }
}

/// Outcome of one bounded batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Rows attempted
    pub processed: usize,
    /// Rows that reached `indexed`
    pub succeeded: usize,
    /// Rows that reached `failed`
    pub failed: usize,
}

/// Outcome of an embedding migration pass
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateReport {
    /// Rows returned to pending
    pub queued: usize,
    /// The model rows are migrating to
    pub current_model: String,
    /// Ids of the outdated components
    pub outdated_components: Vec<Uuid>,
}

/// Drives manifests from `pending` to `indexed`
pub struct ReconcilerService {
    components: Arc<dyn ComponentStore>,
    chunks: Arc<dyn ChunkStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
    config: ReconcilerConfig,
}

impl ReconcilerService {
    /// Create the service with its injected stores and embedding provider
    pub fn new(
        components: Arc<dyn ComponentStore>,
        chunks: Arc<dyn ChunkStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            components,
            chunks,
            embeddings,
            config,
        }
    }

    /// Spawn the background loop. The task runs until aborted.
    pub fn spawn_loop(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let interval = Duration::from_secs(self.config.interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !self.embeddings.is_available() {
                    tracing::debug!("reconciler idle: embedding provider unavailable");
                    continue;
                }
                if let Err(error) = self.sweep_stale().await {
                    tracing::warn!(%error, "stale sweep failed");
                }
                match self.tick().await {
                    Ok(report) if report.processed > 0 => {
                        tracing::info!(
                            processed = report.processed,
                            succeeded = report.succeeded,
                            failed = report.failed,
                            "reconciler tick"
                        );
                    }
                    Ok(_) => {}
                    Err(error) => tracing::warn!(%error, "reconciler tick failed"),
                }
            }
        })
    }

    /// Return abandoned `processing` rows to pending
    pub async fn sweep_stale(&self) -> Result<usize> {
        let reset = self
            .components
            .reset_stale_processing(Duration::from_secs(self.config.stale_after_secs))
            .await?;
        if reset > 0 {
            tracing::warn!(reset, "returned stale processing rows to pending");
        }
        Ok(reset)
    }

    /// One fair cross-tenant batch
    pub async fn tick(&self) -> Result<BatchReport> {
        let limit = self.config.batch_size;
        let rows = self
            .components
            .find_all_pending_fair(limit, self.config.fair_share(limit))
            .await?;
        self.index_rows(rows, true).await
    }

    /// Manually drain pending rows of one org, bounded by `batch_size`.
    ///
    /// Every row is attempted regardless of earlier failures in the batch;
    /// the report aggregates both outcomes.
    pub async fn process_pending(&self, org_id: Uuid, batch_size: usize) -> Result<BatchReport> {
        self.require_embeddings()?;
        let rows: Vec<Component> = self
            .components
            .find_pending(org_id, batch_size)
            .await?
            .into_iter()
            .filter(|row| row.manifest.is_some())
            .collect();
        self.index_rows(rows, true).await
    }

    /// Reset failed rows of an org back to pending
    pub async fn retry_failed(&self, org_id: Uuid) -> Result<usize> {
        self.components.reset_failed_to_pending(org_id).await
    }

    /// Re-index one component now, regardless of its current status.
    ///
    /// Returns the number of chunks created.
    pub async fn force_reindex(&self, org_id: Uuid, component_id: Uuid) -> Result<usize> {
        self.require_embeddings()?;
        let component = self
            .components
            .find_component_by_id(org_id, component_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("component {component_id}")))?;
        if component.manifest.is_none() {
            return Err(Error::validation(
                "component has no manifest; run build first",
            ));
        }
        self.index_component(&component, false).await
    }

    /// Queue indexed rows whose stored model differs from the current one
    pub async fn migrate_embeddings(
        &self,
        org_id: Uuid,
        batch_size: usize,
    ) -> Result<MigrateReport> {
        let current_model = self.embeddings.model_info().model;
        let outdated = self
            .components
            .find_by_outdated_model(org_id, &current_model, batch_size)
            .await?;

        let mut queued = 0;
        let mut outdated_components = Vec::with_capacity(outdated.len());
        for row in &outdated {
            self.components.mark_pending(org_id, row.id).await?;
            outdated_components.push(row.id);
            queued += 1;
        }
        Ok(MigrateReport {
            queued,
            current_model,
            outdated_components,
        })
    }

    async fn index_rows(&self, rows: Vec<Component>, claim: bool) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        if rows.is_empty() {
            return Ok(report);
        }

        let results: Vec<Option<Result<usize>>> = futures::stream::iter(rows)
            .map(|row| async move {
                if claim {
                    // CAS claim: exactly one worker wins a pending row
                    match self.components.claim_for_processing(row.org_id, row.id).await {
                        Ok(true) => {}
                        Ok(false) => return None,
                        Err(error) => return Some(Err(error)),
                    }
                }
                Some(self.index_component(&row, true).await)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        for result in results.into_iter().flatten() {
            report.processed += 1;
            match result {
                Ok(_) => report.succeeded += 1,
                Err(_) => report.failed += 1,
            }
        }
        Ok(report)
    }

    /// Chunk, embed and store one component's manifest.
    ///
    /// `record_failure` controls whether errors also mark the row failed (the
    /// force path surfaces the error to the caller instead).
    async fn index_component(&self, component: &Component, record_failure: bool) -> Result<usize> {
        match self.try_index(component).await {
            Ok(count) => Ok(count),
            Err(error) => {
                if record_failure {
                    let message = error.to_string();
                    if let Err(mark_error) = self
                        .components
                        .mark_failed(component.org_id, component.id, &message)
                        .await
                    {
                        tracing::error!(%mark_error, component_id = %component.id,
                            "failed to record indexing failure");
                    }
                }
                Err(error)
            }
        }
    }

    async fn try_index(&self, component: &Component) -> Result<usize> {
        let manifest = component
            .manifest
            .as_ref()
            .ok_or_else(|| Error::validation("component has no manifest"))?;

        self.chunks
            .delete_chunks(component.org_id, component.id)
            .await?;

        let manifest_chunks = chunk_manifest(manifest);
        if manifest_chunks.is_empty() {
            // An empty manifest still counts as indexed with zero chunks
            self.components
                .mark_indexed(component.org_id, component.id, self.embeddings.model_info())
                .await?;
            return Ok(0);
        }

        let texts: Vec<String> = manifest_chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embeddings.embed_batch(&texts).await?;
        if vectors.len() != manifest_chunks.len() {
            return Err(Error::embedding(format!(
                "embedding count mismatch: expected {}, got {}",
                manifest_chunks.len(),
                vectors.len()
            )));
        }

        let rows: Vec<EmbeddingChunk> = manifest_chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| EmbeddingChunk {
                id: Uuid::new_v4(),
                org_id: component.org_id,
                component_id: component.id,
                chunk_type: chunk.chunk_type,
                content: chunk.content,
                chunk_index: chunk.index,
                embedding,
            })
            .collect();

        let inserted = self.chunks.insert_chunks(rows).await?;
        self.components
            .mark_indexed(component.org_id, component.id, self.embeddings.model_info())
            .await?;
        Ok(inserted)
    }

    fn require_embeddings(&self) -> Result<()> {
        if self.embeddings.is_available() {
            Ok(())
        } else {
            Err(Error::service_unavailable(
                "embedding provider is not configured",
            ))
        }
    }
}

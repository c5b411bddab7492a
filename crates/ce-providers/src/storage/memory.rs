//! In-memory storage backend
//!
//! Stores organizations, keys, components and chunks in concurrent maps.
//! Data is not persisted and is lost on restart; useful for development,
//! tests and single-node deployments. Search semantics mirror the reference
//! database: keyword rank weights name over description and normalizes by
//! document length, semantic search orders by cosine distance with over-fetch
//! and per-component max aggregation.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use ce_application::ports::{
    ApiKeyStore, ComponentPage, ComponentQuery, ComponentStore, ComponentUpsert, ChunkStore,
    EmbeddingStatusCounts, KeywordSearchOptions, ManifestFilter, OrderBy, OrderDir,
    OrganizationStore, SemanticSearchOptions,
};
use ce_domain::constants::SEMANTIC_OVERFETCH_FACTOR;
use ce_domain::entities::{
    ApiKey, Component, EmbeddingChunk, EmbeddingModelInfo, EmbeddingStatus, Organization,
    Visibility,
};
use ce_domain::value_objects::{AiManifest, ComponentMeta, SearchHit};
use ce_domain::{Error, Result};

/// In-memory backend implementing every storage port
#[derive(Debug, Default)]
pub struct MemoryStore {
    orgs: DashMap<Uuid, Organization>,
    api_keys: DashMap<Uuid, ApiKey>,
    components: DashMap<Uuid, Component>,
    chunks: DashMap<Uuid, Vec<EmbeddingChunk>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn components_of_org(&self, org_id: Uuid) -> Vec<Component> {
        self.components
            .iter()
            .filter(|entry| entry.org_id == org_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn hit_for(component: &Component, score: f64) -> SearchHit {
        SearchHit {
            component_id: component.id,
            slug: component.slug.clone(),
            name: component.name.clone(),
            description: component.description().map(str::to_string),
            framework: component.framework,
            score,
        }
    }
}

#[async_trait]
impl OrganizationStore for MemoryStore {
    async fn create_org(&self, name: &str) -> Result<Organization> {
        let org = Organization::new(name);
        self.orgs.insert(org.id, org.clone());
        Ok(org)
    }

    async fn find_org_by_id(&self, id: Uuid) -> Result<Option<Organization>> {
        Ok(self.orgs.get(&id).map(|o| o.clone()))
    }

    async fn list_orgs(&self, limit: usize, offset: usize) -> Result<(Vec<Organization>, usize)> {
        let mut orgs: Vec<Organization> = self.orgs.iter().map(|o| o.value().clone()).collect();
        orgs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let total = orgs.len();
        Ok((orgs.into_iter().skip(offset).take(limit).collect(), total))
    }

    async fn update_org(&self, id: Uuid, name: &str) -> Result<Organization> {
        let mut org = self
            .orgs
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("organization {id}")))?;
        org.name = name.to_string();
        org.updated_at = Utc::now();
        Ok(org.clone())
    }

    async fn delete_org(&self, id: Uuid) -> Result<()> {
        if self.components.iter().any(|c| c.org_id == id) {
            return Err(Error::conflict(
                "organization still has components; delete them first",
            ));
        }
        self.orgs
            .remove(&id)
            .ok_or_else(|| Error::not_found(format!("organization {id}")))?;
        self.api_keys.retain(|_, key| key.org_id != id);
        Ok(())
    }
}

#[async_trait]
impl ApiKeyStore for MemoryStore {
    async fn insert_api_key(&self, key: ApiKey) -> Result<ApiKey> {
        if self.api_keys.iter().any(|k| k.key_hash == key.key_hash) {
            return Err(Error::conflict("a key with this digest already exists"));
        }
        self.api_keys.insert(key.id, key.clone());
        Ok(key)
    }

    async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>> {
        Ok(self
            .api_keys
            .iter()
            .find(|k| k.key_hash == key_hash)
            .map(|k| k.value().clone()))
    }

    async fn list_api_keys(&self, org_id: Uuid) -> Result<Vec<ApiKey>> {
        let mut keys: Vec<ApiKey> = self
            .api_keys
            .iter()
            .filter(|k| k.org_id == org_id)
            .map(|k| k.value().clone())
            .collect();
        keys.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(keys)
    }

    async fn revoke_api_key(&self, org_id: Uuid, key_id: Uuid) -> Result<()> {
        let mut key = self
            .api_keys
            .get_mut(&key_id)
            .filter(|k| k.org_id == org_id)
            .ok_or_else(|| Error::not_found(format!("api key {key_id}")))?;
        key.active = false;
        Ok(())
    }
}

#[async_trait]
impl ComponentStore for MemoryStore {
    async fn upsert_component(
        &self,
        org_id: Uuid,
        data: ComponentUpsert,
    ) -> Result<(Component, bool)> {
        let now = Utc::now();

        let existing_id = match data.id {
            Some(id) => self
                .components
                .get(&id)
                .filter(|c| c.org_id == org_id)
                .map(|c| c.id),
            None => self
                .components
                .iter()
                .find(|c| c.org_id == org_id && c.slug == data.slug)
                .map(|c| c.id),
        };

        if let Some(id) = existing_id {
            // Slug must stay unique within the org even when renamed
            let slug_taken = self
                .components
                .iter()
                .any(|c| c.org_id == org_id && c.slug == data.slug && c.id != id);
            if slug_taken {
                return Err(Error::conflict(format!(
                    "slug {} already exists in this organization",
                    data.slug
                )));
            }

            let mut row = self
                .components
                .get_mut(&id)
                .ok_or_else(|| Error::storage("component vanished during upsert"))?;
            row.slug = data.slug;
            row.name = data.name;
            row.framework = data.framework;
            if data.version.is_some() {
                row.version = data.version;
            }
            if let Some(visibility) = data.visibility {
                row.visibility = visibility;
            }
            row.source_hash = data.source_hash;
            row.extraction = Some(data.extraction);
            row.extraction_diagnostics = Some(data.extraction_diagnostics);
            // A re-extract moves the row back to the first phase
            row.embedding_status = EmbeddingStatus::Pending;
            row.embedding_error = None;
            row.embedding_started_at = None;
            row.updated_at = now;
            return Ok((row.clone(), false));
        }

        let id = data.id.unwrap_or_else(Uuid::new_v4);
        let component = Component {
            id,
            org_id,
            slug: data.slug,
            name: data.name,
            framework: data.framework,
            version: data.version,
            visibility: data.visibility.unwrap_or(Visibility::Private),
            source_hash: data.source_hash,
            extraction: Some(data.extraction),
            extraction_diagnostics: Some(data.extraction_diagnostics),
            generation: None,
            generation_provider: None,
            generation_model: None,
            manifest: None,
            embedding_status: EmbeddingStatus::Pending,
            embedding_error: None,
            embedding_model: None,
            embedding_started_at: None,
            created_at: now,
            updated_at: now,
        };
        self.components.insert(id, component.clone());
        Ok((component, true))
    }

    async fn find_component_by_id(&self, org_id: Uuid, id: Uuid) -> Result<Option<Component>> {
        Ok(self
            .components
            .get(&id)
            .filter(|c| c.org_id == org_id)
            .map(|c| c.clone()))
    }

    async fn find_component_by_slug(
        &self,
        org_id: Uuid,
        slug: &str,
    ) -> Result<Option<Component>> {
        Ok(self
            .components
            .iter()
            .find(|c| c.org_id == org_id && c.slug == slug)
            .map(|c| c.value().clone()))
    }

    async fn find_component_by_name(
        &self,
        org_id: Uuid,
        name: &str,
    ) -> Result<Option<Component>> {
        let lowered = name.to_lowercase();
        Ok(self
            .components
            .iter()
            .find(|c| c.org_id == org_id && c.name.to_lowercase() == lowered)
            .map(|c| c.value().clone()))
    }

    async fn find_many(&self, org_id: Uuid, query: ComponentQuery) -> Result<ComponentPage> {
        let mut rows: Vec<Component> = self
            .components_of_org(org_id)
            .into_iter()
            .filter(|c| query.framework.is_none_or(|f| c.framework == f))
            .filter(|c| query.visibility.is_none_or(|v| c.visibility == v))
            .filter(|c| {
                query
                    .embedding_status
                    .is_none_or(|s| c.embedding_status == s)
            })
            .collect();

        rows.sort_by(|a, b| {
            let ordering = match query.order_by {
                OrderBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                OrderBy::CreatedAt => a.created_at.cmp(&b.created_at),
                OrderBy::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            };
            match query.order {
                OrderDir::Asc => ordering,
                OrderDir::Desc => ordering.reverse(),
            }
        });

        let total = rows.len();
        let items = rows
            .into_iter()
            .skip(query.offset)
            .take(query.limit.max(1))
            .collect();
        Ok(ComponentPage { items, total })
    }

    async fn find_all_manifests(
        &self,
        org_id: Uuid,
        filter: ManifestFilter,
    ) -> Result<Vec<Component>> {
        let limit = if filter.limit == 0 { 100 } else { filter.limit.min(100) };
        let mut rows: Vec<Component> = self
            .components_of_org(org_id)
            .into_iter()
            .filter(|c| c.manifest.is_some())
            .filter(|c| filter.framework.is_none_or(|f| c.framework == f))
            .filter(|c| {
                filter
                    .slugs
                    .as_ref()
                    .is_none_or(|slugs| slugs.contains(&c.slug))
            })
            .collect();
        rows.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn find_all_names(&self, org_id: Uuid) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .components_of_org(org_id)
            .into_iter()
            .map(|c| c.name)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn update_component(
        &self,
        org_id: Uuid,
        id: Uuid,
        name: Option<String>,
        version: Option<String>,
        visibility: Option<Visibility>,
    ) -> Result<Component> {
        let mut row = self
            .components
            .get_mut(&id)
            .filter(|c| c.org_id == org_id)
            .ok_or_else(|| Error::not_found(format!("component {id}")))?;
        if let Some(name) = name {
            row.name = name;
        }
        if let Some(version) = version {
            row.version = Some(version);
        }
        if let Some(visibility) = visibility {
            row.visibility = visibility;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn set_generation(
        &self,
        org_id: Uuid,
        id: Uuid,
        generation: ComponentMeta,
        provider: &str,
        model: &str,
    ) -> Result<Component> {
        let mut row = self
            .components
            .get_mut(&id)
            .filter(|c| c.org_id == org_id)
            .ok_or_else(|| Error::not_found(format!("component {id}")))?;
        row.generation = Some(generation);
        row.generation_provider = Some(provider.to_string());
        row.generation_model = Some(model.to_string());
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn set_manifest(
        &self,
        org_id: Uuid,
        id: Uuid,
        manifest: AiManifest,
    ) -> Result<Component> {
        let mut row = self
            .components
            .get_mut(&id)
            .filter(|c| c.org_id == org_id)
            .ok_or_else(|| Error::not_found(format!("component {id}")))?;
        let changed = row.manifest.as_ref() != Some(&manifest);
        row.manifest = Some(manifest);
        if changed {
            row.embedding_status = EmbeddingStatus::Pending;
            row.embedding_error = None;
            row.embedding_started_at = None;
        }
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete_component(&self, org_id: Uuid, id: Uuid) -> Result<()> {
        let owned = self
            .components
            .get(&id)
            .is_some_and(|c| c.org_id == org_id);
        if !owned {
            return Err(Error::not_found(format!("component {id}")));
        }
        self.components.remove(&id);
        self.chunks.remove(&id);
        Ok(())
    }

    async fn count_by_embedding_status(&self, org_id: Uuid) -> Result<EmbeddingStatusCounts> {
        let mut counts = EmbeddingStatusCounts::default();
        for component in self.components.iter().filter(|c| c.org_id == org_id) {
            match component.embedding_status {
                EmbeddingStatus::Pending => counts.pending += 1,
                EmbeddingStatus::Processing => counts.processing += 1,
                EmbeddingStatus::Indexed => counts.indexed += 1,
                EmbeddingStatus::Failed => counts.failed += 1,
            }
        }
        Ok(counts)
    }

    async fn find_pending(&self, org_id: Uuid, limit: usize) -> Result<Vec<Component>> {
        let mut rows: Vec<Component> = self
            .components_of_org(org_id)
            .into_iter()
            .filter(|c| c.embedding_status == EmbeddingStatus::Pending)
            .collect();
        rows.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn find_all_pending_fair(
        &self,
        limit: usize,
        max_per_org: usize,
    ) -> Result<Vec<Component>> {
        // Bucket pending rows with manifests per org, oldest first
        let mut per_org: BTreeMap<Uuid, Vec<Component>> = BTreeMap::new();
        for component in self.components.iter() {
            if component.embedding_status == EmbeddingStatus::Pending
                && component.manifest.is_some()
            {
                per_org
                    .entry(component.org_id)
                    .or_default()
                    .push(component.value().clone());
            }
        }
        for rows in per_org.values_mut() {
            rows.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
            rows.truncate(max_per_org);
        }

        // Round-robin interleave so no org starves another
        let mut selected = Vec::new();
        let mut round = 0;
        while selected.len() < limit {
            let mut picked_any = false;
            for rows in per_org.values() {
                if let Some(component) = rows.get(round) {
                    selected.push(component.clone());
                    picked_any = true;
                    if selected.len() == limit {
                        break;
                    }
                }
            }
            if !picked_any {
                break;
            }
            round += 1;
        }
        Ok(selected)
    }

    async fn claim_for_processing(&self, org_id: Uuid, id: Uuid) -> Result<bool> {
        let Some(mut row) = self.components.get_mut(&id).filter(|c| c.org_id == org_id) else {
            return Ok(false);
        };
        if row.embedding_status != EmbeddingStatus::Pending {
            return Ok(false);
        }
        row.embedding_status = EmbeddingStatus::Processing;
        row.embedding_error = None;
        row.embedding_started_at = Some(Utc::now());
        Ok(true)
    }

    async fn mark_indexed(&self, org_id: Uuid, id: Uuid, model: EmbeddingModelInfo) -> Result<()> {
        let mut row = self
            .components
            .get_mut(&id)
            .filter(|c| c.org_id == org_id)
            .ok_or_else(|| Error::not_found(format!("component {id}")))?;
        row.embedding_status = EmbeddingStatus::Indexed;
        row.embedding_model = Some(model);
        row.embedding_error = None;
        row.embedding_started_at = None;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_failed(&self, org_id: Uuid, id: Uuid, error: &str) -> Result<()> {
        let mut row = self
            .components
            .get_mut(&id)
            .filter(|c| c.org_id == org_id)
            .ok_or_else(|| Error::not_found(format!("component {id}")))?;
        row.embedding_status = EmbeddingStatus::Failed;
        row.embedding_error = Some(error.to_string());
        row.embedding_started_at = None;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_pending(&self, org_id: Uuid, id: Uuid) -> Result<()> {
        let mut row = self
            .components
            .get_mut(&id)
            .filter(|c| c.org_id == org_id)
            .ok_or_else(|| Error::not_found(format!("component {id}")))?;
        row.embedding_status = EmbeddingStatus::Pending;
        row.embedding_error = None;
        row.embedding_started_at = None;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn reset_failed_to_pending(&self, org_id: Uuid) -> Result<usize> {
        let mut count = 0;
        for mut component in self.components.iter_mut() {
            if component.org_id == org_id
                && component.embedding_status == EmbeddingStatus::Failed
            {
                component.embedding_status = EmbeddingStatus::Pending;
                component.embedding_error = None;
                component.updated_at = Utc::now();
                count += 1;
            }
        }
        Ok(count)
    }

    async fn reset_stale_processing(&self, older_than: Duration) -> Result<usize> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(older_than)
                .unwrap_or_else(|_| chrono::Duration::seconds(600));
        let mut count = 0;
        for mut component in self.components.iter_mut() {
            if component.embedding_status == EmbeddingStatus::Processing
                && component
                    .embedding_started_at
                    .is_none_or(|started| started < cutoff)
            {
                component.embedding_status = EmbeddingStatus::Pending;
                component.embedding_started_at = None;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn find_by_outdated_model(
        &self,
        org_id: Uuid,
        current_model: &str,
        limit: usize,
    ) -> Result<Vec<Component>> {
        let mut rows: Vec<Component> = self
            .components_of_org(org_id)
            .into_iter()
            .filter(|c| c.embedding_status == EmbeddingStatus::Indexed)
            .filter(|c| {
                c.embedding_model
                    .as_ref()
                    .is_none_or(|m| m.model != current_model)
            })
            .collect();
        rows.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn search_keyword(
        &self,
        org_id: Uuid,
        query: &str,
        options: KeywordSearchOptions,
    ) -> Result<Vec<SearchHit>> {
        let parsed = parse_query(query);
        if parsed.terms.is_empty() && parsed.phrases.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = Vec::new();
        for component in self.components_of_org(org_id) {
            if component.embedding_status != EmbeddingStatus::Indexed {
                continue;
            }
            if options.framework.is_some_and(|f| component.framework != f) {
                continue;
            }
            if let Some(score) = keyword_score(&component, &parsed) {
                if score > options.min_score {
                    hits.push(Self::hit_for(&component, score));
                }
            }
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(options.limit);
        Ok(hits)
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn delete_chunks(&self, org_id: Uuid, component_id: Uuid) -> Result<()> {
        if let Some(mut rows) = self.chunks.get_mut(&component_id) {
            rows.retain(|chunk| chunk.org_id != org_id);
        }
        Ok(())
    }

    async fn insert_chunks(&self, chunks: Vec<EmbeddingChunk>) -> Result<usize> {
        let count = chunks.len();
        for chunk in chunks {
            self.chunks.entry(chunk.component_id).or_default().push(chunk);
        }
        Ok(count)
    }

    async fn count_chunks(&self, org_id: Uuid) -> Result<usize> {
        Ok(self
            .chunks
            .iter()
            .flat_map(|rows| rows.iter().map(|c| c.org_id).collect::<Vec<Uuid>>())
            .filter(|owner| *owner == org_id)
            .count())
    }

    async fn count_chunks_by_type(&self, org_id: Uuid) -> Result<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        for rows in self.chunks.iter() {
            for chunk in rows.iter().filter(|c| c.org_id == org_id) {
                *counts.entry(chunk.chunk_type.to_string()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn find_chunks(&self, org_id: Uuid, component_id: Uuid) -> Result<Vec<EmbeddingChunk>> {
        let mut rows: Vec<EmbeddingChunk> = self
            .chunks
            .get(&component_id)
            .map(|rows| {
                rows.iter()
                    .filter(|c| c.org_id == org_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by_key(|c| (c.chunk_type.to_string(), c.chunk_index));
        Ok(rows)
    }

    async fn search_semantic(
        &self,
        org_id: Uuid,
        query_vector: &[f32],
        options: SemanticSearchOptions,
    ) -> Result<Vec<SearchHit>> {
        // Over-fetch chunks ordered by distance, as an ANN index would return
        let overfetch = options.limit.max(1) * SEMANTIC_OVERFETCH_FACTOR;
        let mut scored: Vec<(Uuid, f64)> = Vec::new();
        for rows in self.chunks.iter() {
            for chunk in rows.iter().filter(|c| c.org_id == org_id) {
                let similarity = cosine_similarity(query_vector, &chunk.embedding);
                scored.push((chunk.component_id, similarity));
            }
        }
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(overfetch);

        // Aggregate per component by maximum similarity
        let mut best: HashMap<Uuid, f64> = HashMap::new();
        for (component_id, similarity) in scored {
            let entry = best.entry(component_id).or_insert(similarity);
            if similarity > *entry {
                *entry = similarity;
            }
        }

        let mut hits: Vec<SearchHit> = Vec::new();
        for (component_id, similarity) in best {
            if similarity < options.min_score {
                continue;
            }
            let Some(component) = self.components.get(&component_id) else {
                continue;
            };
            if component.org_id != org_id {
                continue;
            }
            if options.framework.is_some_and(|f| component.framework != f) {
                continue;
            }
            hits.push(Self::hit_for(&component, similarity));
        }

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(options.limit);
        Ok(hits)
    }
}

/// A web-search style query: bare terms, quoted phrases, `-negations`
#[derive(Debug, Default)]
struct ParsedQuery {
    terms: Vec<String>,
    phrases: Vec<String>,
    negations: Vec<String>,
}

fn parse_query(query: &str) -> ParsedQuery {
    let mut parsed = ParsedQuery::default();
    let rest = query.trim();

    // Pull quoted phrases out first, recursing on the remainder
    if let Some(start) = rest.find('"') {
        if let Some(end_rel) = rest[start + 1..].find('"') {
            let phrase = rest[start + 1..start + 1 + end_rel].trim().to_lowercase();
            if !phrase.is_empty() {
                parsed.phrases.push(phrase);
            }
            let mut remaining = String::with_capacity(rest.len());
            remaining.push_str(&rest[..start]);
            remaining.push_str(&rest[start + 2 + end_rel..]);
            return merge_parsed(parsed, parse_query(&remaining));
        }
    }

    for token in rest.split_whitespace() {
        let lowered = token.to_lowercase();
        if let Some(negated) = lowered.strip_prefix('-') {
            if !negated.is_empty() {
                parsed.negations.push(negated.to_string());
            }
        } else {
            parsed.terms.push(lowered);
        }
    }
    parsed
}

fn merge_parsed(mut a: ParsedQuery, b: ParsedQuery) -> ParsedQuery {
    a.terms.extend(b.terms);
    a.phrases.extend(b.phrases);
    a.negations.extend(b.negations);
    a
}

/// Weighted rank over name (weight A) and manifest description (weight B),
/// normalized by `1 + document length` as the reference `ts_rank` call does.
/// `None` when a required term is missing or a negation matches.
fn keyword_score(component: &Component, query: &ParsedQuery) -> Option<f64> {
    const WEIGHT_NAME: f64 = 1.0;
    const WEIGHT_DESCRIPTION: f64 = 0.4;

    let name = component.name.to_lowercase();
    let description = component
        .description()
        .map(str::to_lowercase)
        .unwrap_or_default();

    let name_tokens: Vec<&str> = name.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).collect();
    let description_tokens: Vec<&str> = description
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    let document_length = name_tokens.len() + description_tokens.len();

    let contains = |needle: &str| {
        name_tokens.contains(&needle) || description_tokens.contains(&needle)
    };
    for negation in &query.negations {
        if contains(negation) || name.contains(negation.as_str()) {
            return None;
        }
    }

    let mut raw = 0.0;
    for term in &query.terms {
        let in_name = name_tokens.contains(&term.as_str());
        let in_description = description_tokens.contains(&term.as_str());
        if !in_name && !in_description {
            // Web-search semantics: every bare term must match
            return None;
        }
        if in_name {
            raw += WEIGHT_NAME;
        }
        if in_description {
            raw += WEIGHT_DESCRIPTION;
        }
    }
    for phrase in &query.phrases {
        let in_name = name.contains(phrase.as_str());
        let in_description = description.contains(phrase.as_str());
        if !in_name && !in_description {
            return None;
        }
        if in_name {
            raw += WEIGHT_NAME;
        }
        if in_description {
            raw += WEIGHT_DESCRIPTION;
        }
    }

    if raw == 0.0 {
        return None;
    }
    Some(raw / (1.0 + document_length as f64))
}

/// Cosine similarity of two vectors; zero when either norm is zero
fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

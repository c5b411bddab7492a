//! Keyword / semantic / hybrid search
//!
//! Thin engine over the storage search capabilities: keyword delegates to the
//! weighted full-text rank, semantic embeds the query once and delegates to
//! the cosine ANN, hybrid runs both with over-fetch and fuses the ranked
//! lists with Reciprocal Rank Fusion (k=60).

use std::collections::BTreeMap;
use std::sync::Arc;

use uuid::Uuid;

use ce_domain::constants::{DEFAULT_SEARCH_LIMIT, MAX_QUERY_LENGTH, MAX_SEARCH_LIMIT, RRF_K};
use ce_domain::entities::{EmbeddingModelInfo, Framework};
use ce_domain::value_objects::{SearchHit, SearchMeta, SearchMode, SearchOutcome};
use ce_domain::{Error, Result};

use crate::ports::{
    ChunkStore, ComponentStore, EmbeddingProvider, EmbeddingStatusCounts, KeywordSearchOptions,
    SemanticSearchOptions,
};

/// One search request
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Query text, at most 500 characters
    pub query: String,
    /// Mode; hybrid unless stated
    pub mode: SearchMode,
    /// Result limit, clamped to 50
    pub limit: usize,
    /// Restrict to a framework
    pub framework: Option<Framework>,
    /// Minimum score override
    pub min_score: Option<f64>,
}

impl SearchRequest {
    /// A hybrid request with defaults
    pub fn new<Q: Into<String>>(query: Q) -> Self {
        Self {
            query: query.into(),
            mode: SearchMode::Hybrid,
            limit: DEFAULT_SEARCH_LIMIT,
            framework: None,
            min_score: None,
        }
    }
}

/// Aggregate index statistics for the stats surfaces
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Component counts per embedding status
    pub components: EmbeddingStatusCounts,
    /// Total components
    pub total_components: usize,
    /// Total stored chunks
    pub total_chunks: usize,
    /// Chunk counts per chunk type
    pub chunks_by_type: BTreeMap<String, usize>,
    /// Embedding model of the deployment
    pub embedding_model: EmbeddingModelInfo,
}

/// Search engine over the storage layer
pub struct SearchService {
    components: Arc<dyn ComponentStore>,
    chunks: Arc<dyn ChunkStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl SearchService {
    /// Create the engine with its injected stores and embedding provider
    pub fn new(
        components: Arc<dyn ComponentStore>,
        chunks: Arc<dyn ChunkStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            components,
            chunks,
            embeddings,
        }
    }

    /// Execute a search in the requested mode
    pub async fn search(&self, org_id: Uuid, request: SearchRequest) -> Result<SearchOutcome> {
        let query = request.query.trim().to_string();
        if query.len() > MAX_QUERY_LENGTH {
            return Err(Error::validation_with_details(
                "query too long",
                serde_json::json!({"field": "query", "max": MAX_QUERY_LENGTH}),
            ));
        }
        let limit = clamp_limit(request.limit);

        if query.is_empty() {
            return Ok(SearchOutcome {
                results: Vec::new(),
                total: 0,
                query,
                meta: SearchMeta {
                    search_mode: request.mode,
                    semantic_count: None,
                    keyword_count: None,
                },
            });
        }

        match request.mode {
            SearchMode::Keyword => self.search_keyword(org_id, &query, limit, &request).await,
            SearchMode::Semantic => self.search_semantic(org_id, &query, limit, &request).await,
            SearchMode::Hybrid => self.search_hybrid(org_id, &query, limit, &request).await,
        }
    }

    async fn search_keyword(
        &self,
        org_id: Uuid,
        query: &str,
        limit: usize,
        request: &SearchRequest,
    ) -> Result<SearchOutcome> {
        let hits = self
            .components
            .search_keyword(
                org_id,
                query,
                KeywordSearchOptions {
                    limit,
                    min_score: request.min_score.unwrap_or(0.0),
                    framework: request.framework,
                },
            )
            .await?;
        Ok(outcome(query, SearchMode::Keyword, None, Some(hits.len()), hits))
    }

    async fn search_semantic(
        &self,
        org_id: Uuid,
        query: &str,
        limit: usize,
        request: &SearchRequest,
    ) -> Result<SearchOutcome> {
        self.require_embeddings()?;
        let query_vector = self.embeddings.embed_query(query).await?;
        let hits = self
            .chunks
            .search_semantic(
                org_id,
                &query_vector,
                SemanticSearchOptions {
                    limit,
                    min_score: request
                        .min_score
                        .unwrap_or(ce_domain::constants::DEFAULT_MIN_SEMANTIC_SCORE),
                    framework: request.framework,
                },
            )
            .await?;
        Ok(outcome(query, SearchMode::Semantic, Some(hits.len()), None, hits))
    }

    async fn search_hybrid(
        &self,
        org_id: Uuid,
        query: &str,
        limit: usize,
        request: &SearchRequest,
    ) -> Result<SearchOutcome> {
        self.require_embeddings()?;

        // Over-fetch both lists so fusion has rank depth to work with
        let fetch = (limit * 2).min(MAX_SEARCH_LIMIT * 2);
        let query_vector = self.embeddings.embed_query(query).await?;

        let keyword_hits = self
            .components
            .search_keyword(
                org_id,
                query,
                KeywordSearchOptions {
                    limit: fetch,
                    min_score: 0.0,
                    framework: request.framework,
                },
            )
            .await?;
        let semantic_hits = self
            .chunks
            .search_semantic(
                org_id,
                &query_vector,
                SemanticSearchOptions {
                    limit: fetch,
                    min_score: request
                        .min_score
                        .unwrap_or(ce_domain::constants::DEFAULT_MIN_SEMANTIC_SCORE),
                    framework: request.framework,
                },
            )
            .await?;

        let keyword_count = keyword_hits.len();
        let semantic_count = semantic_hits.len();
        let fused = rrf_fuse(&[keyword_hits, semantic_hits], RRF_K, limit);

        Ok(outcome(
            query,
            SearchMode::Hybrid,
            Some(semantic_count),
            Some(keyword_count),
            fused,
        ))
    }

    /// Resolve a component and find others semantically similar to it
    pub async fn find_similar(
        &self,
        org_id: Uuid,
        identifier: &str,
        limit: usize,
        min_score: Option<f64>,
        framework: Option<Framework>,
    ) -> Result<Vec<SearchHit>> {
        self.require_embeddings()?;

        let component = match self
            .components
            .find_component_by_slug(org_id, identifier)
            .await?
        {
            Some(component) => component,
            None => self
                .components
                .find_component_by_name(org_id, identifier)
                .await?
                .ok_or_else(|| Error::not_found(format!("component {identifier}")))?,
        };

        let query_text = match component.description() {
            Some(description) => format!("{}: {description}", component.name),
            None => component.name.clone(),
        };
        let query_vector = self.embeddings.embed_query(&query_text).await?;

        // Fetch one extra so dropping the component itself still fills the limit
        let hits = self
            .chunks
            .search_semantic(
                org_id,
                &query_vector,
                SemanticSearchOptions {
                    limit: limit + 1,
                    min_score: min_score
                        .unwrap_or(ce_domain::constants::DEFAULT_MIN_SEMANTIC_SCORE),
                    framework,
                },
            )
            .await?;

        Ok(hits
            .into_iter()
            .filter(|hit| hit.component_id != component.id)
            .take(limit)
            .collect())
    }

    /// Aggregate index statistics for an org
    pub async fn index_stats(&self, org_id: Uuid) -> Result<IndexStats> {
        let components = self.components.count_by_embedding_status(org_id).await?;
        let total_chunks = self.chunks.count_chunks(org_id).await?;
        let chunks_by_type = self.chunks.count_chunks_by_type(org_id).await?;
        Ok(IndexStats {
            total_components: components.total(),
            components,
            total_chunks,
            chunks_by_type,
            embedding_model: self.embeddings.model_info(),
        })
    }

    fn require_embeddings(&self) -> Result<()> {
        if self.embeddings.is_available() {
            Ok(())
        } else {
            Err(Error::service_unavailable(
                "embedding provider is not configured; only keyword search is available",
            ))
        }
    }
}

fn clamp_limit(limit: usize) -> usize {
    if limit == 0 {
        DEFAULT_SEARCH_LIMIT
    } else {
        limit.min(MAX_SEARCH_LIMIT)
    }
}

fn outcome(
    query: &str,
    mode: SearchMode,
    semantic_count: Option<usize>,
    keyword_count: Option<usize>,
    results: Vec<SearchHit>,
) -> SearchOutcome {
    SearchOutcome {
        total: results.len(),
        results,
        query: query.to_string(),
        meta: SearchMeta {
            search_mode: mode,
            semantic_count,
            keyword_count,
        },
    }
}

/// Fuse ranked lists with Reciprocal Rank Fusion.
///
/// Every component appearing in a list at 1-indexed rank `r` contributes
/// `1/(k+r)` to its fused score. Ties in fused score break on the earlier
/// best rank so identical lists preserve their order.
pub fn rrf_fuse(lists: &[Vec<SearchHit>], k: usize, limit: usize) -> Vec<SearchHit> {
    struct Fused {
        hit: SearchHit,
        score: f64,
        best_rank: usize,
    }

    let mut by_component: BTreeMap<Uuid, Fused> = BTreeMap::new();
    for list in lists {
        for (index, hit) in list.iter().enumerate() {
            let rank = index + 1;
            let contribution = 1.0 / (k + rank) as f64;
            by_component
                .entry(hit.component_id)
                .and_modify(|fused| {
                    fused.score += contribution;
                    fused.best_rank = fused.best_rank.min(rank);
                })
                .or_insert_with(|| Fused {
                    hit: hit.clone(),
                    score: contribution,
                    best_rank: rank,
                });
        }
    }

    let mut fused: Vec<Fused> = by_component.into_values().collect();
    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.best_rank.cmp(&b.best_rank))
    });

    fused
        .into_iter()
        .take(limit)
        .map(|f| {
            let mut hit = f.hit;
            hit.score = f.score;
            hit
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: Uuid, name: &str) -> SearchHit {
        SearchHit {
            component_id: id,
            slug: format!("{}-react-00000000", name.to_lowercase()),
            name: name.to_string(),
            description: None,
            framework: Framework::React,
            score: 1.0,
        }
    }

    #[test]
    fn rrf_of_empty_lists_is_empty() {
        assert!(rrf_fuse(&[vec![], vec![]], RRF_K, 10).is_empty());
    }

    #[test]
    fn rrf_of_identical_lists_preserves_order() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let list: Vec<SearchHit> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| hit(*id, &format!("C{i}")))
            .collect();
        let fused = rrf_fuse(&[list.clone(), list.clone()], RRF_K, 10);
        let fused_ids: Vec<Uuid> = fused.iter().map(|h| h.component_id).collect();
        assert_eq!(fused_ids, ids);
    }

    #[test]
    fn rrf_matches_spec_worked_example() {
        // Keyword = [A, B, C], Semantic = [B, D, A], k = 60
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let d = Uuid::new_v4();

        let keyword = vec![hit(a, "A"), hit(b, "B"), hit(c, "C")];
        let semantic = vec![hit(b, "B"), hit(d, "D"), hit(a, "A")];

        let fused = rrf_fuse(&[keyword, semantic], 60, 10);
        let names: Vec<&str> = fused.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A", "D", "C"]);

        let score = |name: &str| {
            fused
                .iter()
                .find(|h| h.name == name)
                .map(|h| h.score)
                .unwrap()
        };
        assert!((score("A") - (1.0 / 61.0 + 1.0 / 63.0)).abs() < 1e-9);
        assert!((score("B") - (1.0 / 62.0 + 1.0 / 61.0)).abs() < 1e-9);
        assert!((score("C") - 1.0 / 63.0).abs() < 1e-9);
        assert!((score("D") - 1.0 / 62.0).abs() < 1e-9);
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(clamp_limit(0), DEFAULT_SEARCH_LIMIT);
        assert_eq!(clamp_limit(7), 7);
        assert_eq!(clamp_limit(500), MAX_SEARCH_LIMIT);
    }
}

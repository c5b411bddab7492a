//! Search request and result shapes

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Framework;

/// Search mode selector
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Dense-vector similarity over manifest chunks
    Semantic,
    /// Weighted full-text rank over name and description
    Keyword,
    /// Both, fused with Reciprocal Rank Fusion (default)
    #[default]
    Hybrid,
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Semantic => "semantic",
            Self::Keyword => "keyword",
            Self::Hybrid => "hybrid",
        };
        f.write_str(s)
    }
}

/// One search result projected to the wire shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// Matching component id
    pub component_id: Uuid,
    /// Component slug
    pub slug: String,
    /// Component name
    pub name: String,
    /// Manifest description, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Authoring framework
    pub framework: Framework,
    /// Mode-specific relevance score
    pub score: f64,
}

/// Metadata about how a search was executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
    /// Mode that ran
    pub search_mode: SearchMode,
    /// Semantic candidate count before fusion (hybrid/semantic only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_count: Option<usize>,
    /// Keyword candidate count before fusion (hybrid/keyword only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_count: Option<usize>,
}

/// A completed search: hits plus execution metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    /// Ranked hits
    pub results: Vec<SearchHit>,
    /// Number of hits returned
    pub total: usize,
    /// The query as executed
    pub query: String,
    /// Execution metadata
    pub meta: SearchMeta,
}

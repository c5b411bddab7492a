//! Domain-level constants and closed sets

/// Maximum characters per embedding chunk; longer content is truncated
pub const CHUNK_MAX_CHARS: usize = 4000;

/// Suffix appended when a chunk is truncated
pub const CHUNK_TRUNCATION_SUFFIX: &str = "...";

/// Reciprocal Rank Fusion constant
pub const RRF_K: usize = 60;

/// Fair-share divisor for reconciler batches: no org exceeds ceil(batch/10)
pub const FAIR_SHARE_DIVISOR: usize = 10;

/// Fixed embedding dimensionality of the reference deployment
pub const EMBEDDING_DIMENSIONS: usize = 1024;

/// Over-fetch multiplier applied to semantic chunk queries before
/// per-component aggregation
pub const SEMANTIC_OVERFETCH_FACTOR: usize = 3;

/// Default minimum similarity for semantic search
pub const DEFAULT_MIN_SEMANTIC_SCORE: f64 = 0.5;

/// Default and maximum search result limits
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Maximum accepted search limit
pub const MAX_SEARCH_LIMIT: usize = 50;
/// Maximum accepted query length
pub const MAX_QUERY_LENGTH: usize = 500;

/// Manifest example budgets
pub const MAX_COMMON_EXAMPLES: usize = 8;
/// Maximum advanced examples carried into a manifest
pub const MAX_ADVANCED_EXAMPLES: usize = 3;

/// Tenant API key prefix
pub const API_KEY_PREFIX: &str = "ce_";
/// Platform admin token prefix (checked before the tenant prefix)
pub const PLATFORM_TOKEN_PREFIX: &str = "cep_";
/// Hex characters in the random part of a tenant key
pub const API_KEY_HEX_LEN: usize = 64;
/// Identifying prefix stored alongside the key digest
pub const API_KEY_ID_PREFIX_LEN: usize = 8;

//! Component entity and its lifecycle enums

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value_objects::{AiManifest, ComponentMeta, ExtractedData, ExtractionDiagnostics};

/// UI framework a component is authored in.
///
/// The pipeline is implemented for `react`; the remaining values are reserved
/// identifiers accepted by the API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    /// React (implemented)
    #[default]
    React,
    /// Vue (reserved)
    Vue,
    /// Svelte (reserved)
    Svelte,
    /// Angular (reserved)
    Angular,
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::React => "react",
            Self::Vue => "vue",
            Self::Svelte => "svelte",
            Self::Angular => "angular",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Framework {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "react" => Ok(Self::React),
            "vue" => Ok(Self::Vue),
            "svelte" => Ok(Self::Svelte),
            "angular" => Ok(Self::Angular),
            other => Err(crate::Error::validation(format!(
                "unknown framework: {other}"
            ))),
        }
    }
}

/// Component visibility level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible only to the creating key's org (default)
    #[default]
    Private,
    /// Visible across the org
    Org,
    /// Publicly visible
    Public,
}

/// Embedding lifecycle of a component's manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingStatus {
    /// Manifest changed; chunks not yet (re)built
    #[default]
    Pending,
    /// A reconciler worker claimed the row
    Processing,
    /// Chunks embedded and stored
    Indexed,
    /// Last indexing attempt failed; see `embedding_error`
    Failed,
}

impl std::fmt::Display for EmbeddingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Indexed => "indexed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Descriptor of the embedding model used to index a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingModelInfo {
    /// Provider name (e.g. "voyage")
    pub provider: String,
    /// Model identifier (e.g. "voyage-3-large")
    pub model: String,
    /// Vector dimensionality
    pub dimensions: usize,
}

/// A component row: identity plus the three pipeline payloads.
///
/// Invariants enforced by the processing service:
/// - `generation` requires `extraction`; `manifest` requires both.
/// - `embedding_status == Indexed` implies `manifest` is present.
/// - A new extraction resets `embedding_status` to `Pending` and downstream
///   payloads are rebuilt before chunks exist again.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Stable identifier
    pub id: Uuid,
    /// Owning organization
    pub org_id: Uuid,
    /// Per-org unique slug: `{kebab(name)}-{framework}-{id[0..8]}`
    pub slug: String,
    /// Display name (e.g. "AlertDialog")
    pub name: String,
    /// Authoring framework
    pub framework: Framework,
    /// Optional library version string
    pub version: Option<String>,
    /// Visibility level
    pub visibility: Visibility,
    /// Stable digest of the exact source text
    pub source_hash: String,
    /// Structural extraction payload
    pub extraction: Option<ExtractedData>,
    /// Diagnostics from the last extraction run
    pub extraction_diagnostics: Option<ExtractionDiagnostics>,
    /// LLM-generated semantic metadata
    pub generation: Option<ComponentMeta>,
    /// Provider that produced `generation`
    pub generation_provider: Option<String>,
    /// Model that produced `generation`
    pub generation_model: Option<String>,
    /// Canonical merged manifest
    pub manifest: Option<AiManifest>,
    /// Embedding lifecycle state
    pub embedding_status: EmbeddingStatus,
    /// Error message of the last failed indexing attempt
    pub embedding_error: Option<String>,
    /// Model used for the stored chunks
    pub embedding_model: Option<EmbeddingModelInfo>,
    /// When a reconciler worker claimed the row (stale-sweep bookkeeping)
    pub embedding_started_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Component {
    /// Description used for search ranking and listings, taken from the
    /// manifest when present
    pub fn description(&self) -> Option<&str> {
        self.manifest.as_ref().map(|m| m.description.as_str())
    }
}

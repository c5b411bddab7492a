//! Null metadata generator
//!
//! Stands in when no LLM provider is configured. Every call fails with a
//! service-unavailable error so the generate endpoint degrades to 503.

use async_trait::async_trait;

use ce_application::ports::{GenerationOutcome, GenerationRequest, MetaGenerator};
use ce_domain::{Error, Result};

/// Placeholder provider for unconfigured deployments
#[derive(Debug, Default)]
pub struct NullGenerator;

impl NullGenerator {
    /// Create the null provider
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetaGenerator for NullGenerator {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationOutcome> {
        Err(Error::service_unavailable(
            "metadata generation provider is not configured",
        ))
    }

    fn provider_name(&self) -> &str {
        "null"
    }

    fn model(&self) -> &str {
        "none"
    }

    fn is_available(&self) -> bool {
        false
    }
}

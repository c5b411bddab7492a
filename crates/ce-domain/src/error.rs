//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Failure class of a metadata generation call, mapped from the provider's
/// HTTP-level response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationErrorKind {
    /// Invalid or missing provider credentials
    Auth,
    /// Provider rate limit hit
    RateLimit,
    /// Provider reported itself unavailable (5xx / overloaded)
    Unavailable,
    /// Request timed out
    Timeout,
    /// Anything else (malformed output, unexpected status, transport)
    Other,
}

impl std::fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Auth => "auth",
            Self::RateLimit => "rate-limit",
            Self::Unavailable => "unavailable",
            Self::Timeout => "timeout",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// Main error type for the Context Engine
#[derive(Error, Debug)]
pub enum Error {
    /// Client-visible input validation failure
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the invalid input
        message: String,
        /// Optional machine-readable details
        details: Option<serde_json::Value>,
    },

    /// Resource not found
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// Uniqueness or state conflict not absorbed by upsert semantics
    #[error("Conflict: {message}")]
    Conflict {
        /// Description of the conflict
        message: String,
    },

    /// Missing or invalid credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of the authentication failure
        message: String,
    },

    /// Authenticated but not permitted
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Description of the authorization failure
        message: String,
    },

    /// Component source extraction failure
    ///
    /// Pipeline callers never surface this as a 5xx; a degraded extraction is
    /// reported through the extraction diagnostics instead.
    #[error("Extraction failed: {message}")]
    Extraction {
        /// Description of the extraction failure
        message: String,
    },

    /// Metadata generation failure, annotated with provider and class
    #[error("Generation failed ({provider}/{model}, {kind}): {message}")]
    Generation {
        /// Provider that failed (e.g. "anthropic")
        provider: String,
        /// Model identifier used for the call
        model: String,
        /// Failure class
        kind: GenerationErrorKind,
        /// Description of the failure
        message: String,
    },

    /// Embedding provider operation error
    #[error("Embedding provider error: {message}")]
    Embedding {
        /// Description of the embedding failure
        message: String,
    },

    /// A required downstream service is absent or down
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Description of the unavailable service
        message: String,
    },

    /// Storage layer operation error
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O operation error
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// JSON parsing or serialization error
    #[error("JSON parsing error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

// Basic error creation methods
impl Error {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// Create a validation error with machine-readable details
    pub fn validation_with_details<S: Into<String>>(
        message: S,
        details: serde_json::Value,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            details: Some(details),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict<S: Into<String>>(message: S) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create an unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a forbidden error
    pub fn forbidden<S: Into<String>>(message: S) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create an extraction error
    pub fn extraction<S: Into<String>>(message: S) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Create a generation error
    pub fn generation<P, M, S>(provider: P, model: M, kind: GenerationErrorKind, message: S) -> Self
    where
        P: Into<String>,
        M: Into<String>,
        S: Into<String>,
    {
        Self::Generation {
            provider: provider.into(),
            model: model.into(),
            kind,
            message: message.into(),
        }
    }

    /// Create an embedding provider error
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a service unavailable error
    pub fn service_unavailable<S: Into<String>>(message: S) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// Storage and configuration error creation methods
impl Error {
    /// Create a storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Create a storage error with source
    pub fn storage_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    >(
        message: S,
        source: E,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl Error {
    /// Machine-readable error code for API envelopes
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::Extraction { .. } => "EXTRACTION_FAILED",
            Self::Generation { .. } => "GENERATION_FAILED",
            Self::Embedding { .. } => "EMBEDDING_ERROR",
            Self::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Json { .. } => "JSON_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

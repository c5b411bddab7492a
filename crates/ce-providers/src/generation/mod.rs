//! LLM metadata generators
//!
//! One adapter per provider behind the `MetaGenerator` port. Every adapter
//! executes the single `generate_component_metadata` tool call, classifies
//! HTTP failures into the typed generation error kinds, and never retries.

mod anthropic;
mod gemini;
mod null;

pub use anthropic::AnthropicGenerator;
pub use gemini::GeminiGenerator;
pub use null::NullGenerator;

use ce_domain::error::GenerationErrorKind;

/// Map an HTTP status to a generation error kind
pub(crate) fn kind_for_status(status: reqwest::StatusCode) -> GenerationErrorKind {
    match status.as_u16() {
        401 | 403 => GenerationErrorKind::Auth,
        429 => GenerationErrorKind::RateLimit,
        500..=599 => GenerationErrorKind::Unavailable,
        _ => GenerationErrorKind::Other,
    }
}

/// Map a transport error to a generation error kind
pub(crate) fn kind_for_transport(error: &reqwest::Error) -> GenerationErrorKind {
    if error.is_timeout() {
        GenerationErrorKind::Timeout
    } else {
        GenerationErrorKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(
            kind_for_status(reqwest::StatusCode::UNAUTHORIZED),
            GenerationErrorKind::Auth
        );
        assert_eq!(
            kind_for_status(reqwest::StatusCode::TOO_MANY_REQUESTS),
            GenerationErrorKind::RateLimit
        );
        assert_eq!(
            kind_for_status(reqwest::StatusCode::SERVICE_UNAVAILABLE),
            GenerationErrorKind::Unavailable
        );
        assert_eq!(
            kind_for_status(reqwest::StatusCode::BAD_REQUEST),
            GenerationErrorKind::Other
        );
    }
}

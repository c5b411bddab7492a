//! API response envelope and error mapping
//!
//! Success bodies are `{"success": true, "data": ...}`; failures are
//! `{"success": false, "error": {"code", "message", "details?"}}` with the
//! status mapped from the domain error taxonomy.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use ce_domain::Error;
use ce_domain::error::GenerationErrorKind;

/// Handler result carrying the mapped error
pub type ApiResult<T> = Result<T, ApiError>;

/// Wrap payload in the success envelope
pub fn success<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({"success": true, "data": data}))
}

/// Wrap payload in the success envelope with an explicit status
pub fn success_with_status<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, success(data)).into_response()
}

/// A domain error on its way to the wire
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::Generation { kind, .. } => match kind {
                GenerationErrorKind::RateLimit
                | GenerationErrorKind::Unavailable
                | GenerationErrorKind::Timeout => StatusCode::SERVICE_UNAVAILABLE,
                GenerationErrorKind::Auth | GenerationErrorKind::Other => StatusCode::BAD_GATEWAY,
            },
            Error::Extraction { .. }
            | Error::Embedding { .. }
            | Error::Storage { .. }
            | Error::Configuration { .. }
            | Error::Io { .. }
            | Error::Json { .. }
            | Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let mut error_body = serde_json::json!({
            "code": self.0.code(),
            "message": self.0.to_string(),
        });
        if let Error::Validation {
            details: Some(details),
            ..
        } = &self.0
        {
            error_body["details"] = details.clone();
        }
        if let Error::Generation { provider, .. } = &self.0 {
            error_body["provider"] = serde_json::json!(provider);
        }

        let body = serde_json::json!({"success": false, "error": error_body});
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_the_taxonomy() {
        assert_eq!(
            ApiError(Error::validation("bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(Error::not_found("thing")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(Error::service_unavailable("down")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError(Error::generation(
                "anthropic",
                "m",
                GenerationErrorKind::Timeout,
                "slow"
            ))
            .status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError(Error::generation(
                "anthropic",
                "m",
                GenerationErrorKind::Auth,
                "denied"
            ))
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}

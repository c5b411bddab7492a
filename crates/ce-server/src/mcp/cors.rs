//! MCP CORS handling
//!
//! The streamable transport writes its response directly, bypassing the
//! framework's response abstraction, so CORS headers are set on the raw
//! header map rather than through a middleware layer. Permissive mode
//! reflects any origin; strict mode only the configured list.

use axum::http::{HeaderMap, HeaderValue, header};

use ce_infrastructure::config::{CorsConfig, McpCorsMode};

use super::{PROTOCOL_VERSION_HEADER, SESSION_ID_HEADER};

/// Write the MCP CORS headers for a request origin
pub fn write_cors_headers(
    response_headers: &mut HeaderMap,
    request_headers: &HeaderMap,
    config: &CorsConfig,
) {
    let origin = request_headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok());

    let allowed = match (config.mcp_mode, origin) {
        (McpCorsMode::Permissive, Some(origin)) => Some(origin.to_string()),
        (McpCorsMode::Permissive, None) => Some("*".to_string()),
        (McpCorsMode::Strict, Some(origin)) => config
            .allowed_origins
            .iter()
            .any(|candidate| candidate == origin)
            .then(|| origin.to_string()),
        (McpCorsMode::Strict, None) => None,
    };

    if let Some(allowed) = allowed {
        if let Ok(value) = HeaderValue::from_str(&allowed) {
            response_headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
        }
        response_headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
        );
        response_headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("authorization, content-type, mcp-session-id, mcp-protocol-version"),
        );
        // The transport headers must be readable by browser clients
        let exposed = format!("{SESSION_ID_HEADER}, {PROTOCOL_VERSION_HEADER}");
        if let Ok(value) = HeaderValue::from_str(&exposed) {
            response_headers.insert(header::ACCESS_CONTROL_EXPOSE_HEADERS, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_origin(origin: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, HeaderValue::from_str(origin).unwrap());
        headers
    }

    #[test]
    fn permissive_mode_reflects_the_origin() {
        let config = CorsConfig::default();
        let mut response = HeaderMap::new();
        write_cors_headers(&mut response, &request_with_origin("https://studio.example"), &config);
        assert_eq!(
            response.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://studio.example"
        );
        let exposed = response
            .get(header::ACCESS_CONTROL_EXPOSE_HEADERS)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(exposed.contains("mcp-session-id"));
        assert!(exposed.contains("mcp-protocol-version"));
    }

    #[test]
    fn strict_mode_only_allows_the_configured_list() {
        let config = CorsConfig {
            allowed_origins: vec!["https://allowed.example".to_string()],
            mcp_mode: McpCorsMode::Strict,
        };

        let mut response = HeaderMap::new();
        write_cors_headers(&mut response, &request_with_origin("https://allowed.example"), &config);
        assert!(response.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_some());

        let mut response = HeaderMap::new();
        write_cors_headers(&mut response, &request_with_origin("https://other.example"), &config);
        assert!(response.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}

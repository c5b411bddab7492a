//! Request authentication
//!
//! An extractor validates the bearer token into an [`AuthContext`]; handlers
//! then assert tenant scope and org-path agreement, or platform access.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use ce_domain::Error;
use ce_domain::auth::{AuthContext, Scope, TenantAuthContext};

use crate::http::response::ApiError;
use crate::state::AppState;

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct Authed(pub AuthContext);

impl FromRequestParts<AppState> for Authed {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError(Error::unauthorized("missing bearer token")))?;
        let context = state.context.auth.validate_token(&token).await?;
        Ok(Self(context))
    }
}

/// Pull the token out of the `Authorization: Bearer` header
pub fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Assert a tenant context with the given scope, bound to the org in the path
pub fn require_scope(
    authed: &Authed,
    org_id: Uuid,
    scope: Scope,
) -> Result<TenantAuthContext, ApiError> {
    let AuthContext::Tenant(tenant) = &authed.0 else {
        return Err(ApiError(Error::forbidden(
            "a tenant API key is required for this route",
        )));
    };
    if tenant.org_id != org_id {
        return Err(ApiError(Error::forbidden(
            "API key does not belong to this organization",
        )));
    }
    if !authed.0.has_scope(scope) {
        return Err(ApiError(Error::forbidden(format!(
            "missing required scope: {}",
            scope.as_str()
        ))));
    }
    Ok(tenant.clone())
}

/// Assert the platform admin context
pub fn require_platform(authed: &Authed) -> Result<(), ApiError> {
    if authed.0.is_platform() {
        Ok(())
    } else {
        Err(ApiError(Error::forbidden(
            "the platform token is required for this route",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ce_domain::auth::PlatformAuthContext;

    fn tenant(org_id: Uuid, scopes: Vec<Scope>) -> Authed {
        Authed(AuthContext::Tenant(TenantAuthContext {
            org_id,
            api_key_id: Uuid::new_v4(),
            scopes,
        }))
    }

    #[test]
    fn org_path_must_match_the_key() {
        let org = Uuid::new_v4();
        let authed = tenant(org, vec![Scope::ComponentRead]);
        assert!(require_scope(&authed, org, Scope::ComponentRead).is_ok());
        assert!(require_scope(&authed, Uuid::new_v4(), Scope::ComponentRead).is_err());
    }

    #[test]
    fn missing_scope_is_forbidden() {
        let org = Uuid::new_v4();
        let authed = tenant(org, vec![Scope::ComponentRead]);
        assert!(require_scope(&authed, org, Scope::ComponentWrite).is_err());
    }

    #[test]
    fn platform_context_never_reaches_tenant_routes() {
        let authed = Authed(AuthContext::Platform(PlatformAuthContext::default()));
        assert!(require_scope(&authed, Uuid::new_v4(), Scope::ComponentRead).is_err());
        assert!(require_platform(&authed).is_ok());
    }
}

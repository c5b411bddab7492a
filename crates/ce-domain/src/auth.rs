//! Auth contexts and scope checks
//!
//! Two token families front the API: org-scoped tenant keys (`ce_`) and the
//! cross-tenant platform token (`cep_`). Validation lives in the application
//! layer; this module defines the resulting contexts and the scope algebra.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant scope enumeration.
///
/// Unknown scope strings on stored keys are dropped at validation time, so a
/// context only ever carries members of this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Read components, manifests and search
    #[serde(rename = "component:read")]
    ComponentRead,
    /// Create and update components and pipeline phases
    #[serde(rename = "component:write")]
    ComponentWrite,
    /// Delete components
    #[serde(rename = "component:delete")]
    ComponentDelete,
    /// Reconciliation and index management
    #[serde(rename = "embedding:manage")]
    EmbeddingManage,
    /// All tenant scopes
    #[serde(rename = "admin")]
    Admin,
}

impl Scope {
    /// Parse a stored scope string, returning `None` for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "component:read" => Some(Self::ComponentRead),
            "component:write" => Some(Self::ComponentWrite),
            "component:delete" => Some(Self::ComponentDelete),
            "embedding:manage" => Some(Self::EmbeddingManage),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Canonical string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ComponentRead => "component:read",
            Self::ComponentWrite => "component:write",
            Self::ComponentDelete => "component:delete",
            Self::EmbeddingManage => "embedding:manage",
            Self::Admin => "admin",
        }
    }
}

/// Context established by a valid tenant API key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantAuthContext {
    /// Organization the key belongs to
    pub org_id: Uuid,
    /// The validated key's id
    pub api_key_id: Uuid,
    /// Scopes granted to the key, filtered to the known enumeration
    pub scopes: Vec<Scope>,
}

/// Context established by the platform admin token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformAuthContext {
    /// Always `["platform:admin"]`
    pub scopes: Vec<String>,
}

impl Default for PlatformAuthContext {
    fn default() -> Self {
        Self {
            scopes: vec!["platform:admin".to_string()],
        }
    }
}

/// Authenticated caller identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// Org-scoped tenant key
    Tenant(TenantAuthContext),
    /// Cross-tenant platform token
    Platform(PlatformAuthContext),
}

impl AuthContext {
    /// Whether the context satisfies a tenant scope.
    ///
    /// A tenant context satisfies `s` when it holds `admin` or `s` itself.
    /// Platform contexts never satisfy tenant scopes.
    pub fn has_scope(&self, scope: Scope) -> bool {
        match self {
            Self::Tenant(ctx) => {
                ctx.scopes.contains(&Scope::Admin) || ctx.scopes.contains(&scope)
            }
            Self::Platform(_) => false,
        }
    }

    /// Whether the context satisfies every scope in `scopes`.
    ///
    /// Vacuously true for tenant contexts when `scopes` is empty.
    pub fn has_all_scopes(&self, scopes: &[Scope]) -> bool {
        match self {
            Self::Tenant(_) => scopes.iter().all(|s| self.has_scope(*s)),
            Self::Platform(_) => false,
        }
    }

    /// Whether this is the platform context
    pub fn is_platform(&self) -> bool {
        matches!(self, Self::Platform(_))
    }

    /// Org id for tenant contexts
    pub fn org_id(&self) -> Option<Uuid> {
        match self {
            Self::Tenant(ctx) => Some(ctx.org_id),
            Self::Platform(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(scopes: Vec<Scope>) -> AuthContext {
        AuthContext::Tenant(TenantAuthContext {
            org_id: Uuid::new_v4(),
            api_key_id: Uuid::new_v4(),
            scopes,
        })
    }

    #[test]
    fn admin_satisfies_every_tenant_scope() {
        let ctx = tenant(vec![Scope::Admin]);
        assert!(ctx.has_scope(Scope::ComponentRead));
        assert!(ctx.has_scope(Scope::ComponentDelete));
        assert!(ctx.has_all_scopes(&[Scope::ComponentWrite, Scope::EmbeddingManage]));
    }

    #[test]
    fn platform_never_satisfies_tenant_scopes() {
        let ctx = AuthContext::Platform(PlatformAuthContext::default());
        assert!(!ctx.has_scope(Scope::ComponentRead));
        assert!(!ctx.has_all_scopes(&[]));
        assert!(ctx.is_platform());
    }

    #[test]
    fn empty_scope_list_is_vacuously_satisfied_for_tenants() {
        let ctx = tenant(vec![]);
        assert!(ctx.has_all_scopes(&[]));
        assert!(!ctx.has_scope(Scope::ComponentRead));
    }

    #[test]
    fn unknown_scope_strings_parse_to_none() {
        assert_eq!(Scope::parse("component:read"), Some(Scope::ComponentRead));
        assert_eq!(Scope::parse("platform:admin"), None);
        assert_eq!(Scope::parse(""), None);
    }
}

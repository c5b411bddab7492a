//! Tenant/platform token validation and key issuance
//!
//! Two token families, distinguished by prefix. `cep_` (platform) is checked
//! before `ce_` (tenant); anything else is rejected. Raw tenant keys are
//! never stored — only their HMAC-SHA256 digest under the server secret.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use uuid::Uuid;

use ce_domain::auth::{AuthContext, PlatformAuthContext, Scope, TenantAuthContext};
use ce_domain::constants::{
    API_KEY_HEX_LEN, API_KEY_ID_PREFIX_LEN, API_KEY_PREFIX, PLATFORM_TOKEN_PREFIX,
};
use ce_domain::entities::ApiKey;
use ce_domain::{Error, Result};

use crate::ports::ApiKeyStore;

type HmacSha256 = Hmac<Sha256>;

/// A freshly issued key: the raw secret exists only in this value
#[derive(Debug)]
pub struct IssuedKey {
    /// Stored record (digest, prefix, scopes)
    pub record: ApiKey,
    /// The raw key, returned to the caller exactly once
    pub raw_key: String,
}

/// Validates bearer tokens and issues tenant keys
pub struct AuthService {
    keys: Arc<dyn ApiKeyStore>,
    hash_secret: String,
    platform_token: Option<String>,
}

impl AuthService {
    /// Create the service with the configured HMAC secret and platform token
    pub fn new(
        keys: Arc<dyn ApiKeyStore>,
        hash_secret: String,
        platform_token: Option<String>,
    ) -> Self {
        Self {
            keys,
            hash_secret,
            platform_token,
        }
    }

    /// Validate a bearer token into an auth context.
    ///
    /// The platform prefix is checked first so a platform token never hits
    /// the key table.
    pub async fn validate_token(&self, token: &str) -> Result<AuthContext> {
        if token.starts_with(PLATFORM_TOKEN_PREFIX) {
            return self.validate_platform_token(token);
        }
        if token.starts_with(API_KEY_PREFIX) {
            return self.validate_tenant_key(token).await;
        }
        Err(Error::unauthorized("unrecognized token format"))
    }

    fn validate_platform_token(&self, token: &str) -> Result<AuthContext> {
        let configured = self
            .platform_token
            .as_deref()
            .ok_or_else(|| Error::unauthorized("platform access is not configured"))?;
        if constant_time_eq(token.as_bytes(), configured.as_bytes()) {
            Ok(AuthContext::Platform(PlatformAuthContext::default()))
        } else {
            Err(Error::unauthorized("invalid platform token"))
        }
    }

    async fn validate_tenant_key(&self, token: &str) -> Result<AuthContext> {
        let secret = &token[API_KEY_PREFIX.len()..];
        if secret.len() != API_KEY_HEX_LEN || !secret.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::unauthorized("malformed API key"));
        }

        let digest = self.digest(token);
        let record = self
            .keys
            .find_api_key_by_hash(&digest)
            .await?
            .ok_or_else(|| Error::unauthorized("unknown API key"))?;

        // The lookup already matched the digest; the constant-time comparison
        // guards against stores that match on a weaker key.
        if !constant_time_eq(record.key_hash.as_bytes(), digest.as_bytes()) {
            return Err(Error::unauthorized("unknown API key"));
        }
        if !record.is_valid_at(Utc::now()) {
            return Err(Error::unauthorized("API key is inactive or expired"));
        }

        Ok(AuthContext::Tenant(TenantAuthContext {
            org_id: record.org_id,
            api_key_id: record.id,
            scopes: record.scopes,
        }))
    }

    /// Issue a new tenant key for an org.
    ///
    /// Scope strings outside the known enumeration are rejected up front so a
    /// stored key only ever carries valid scopes.
    pub async fn issue_key(
        &self,
        org_id: Uuid,
        scope_names: &[String],
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<IssuedKey> {
        let mut scopes = Vec::with_capacity(scope_names.len());
        for name in scope_names {
            let scope = Scope::parse(name)
                .ok_or_else(|| Error::validation(format!("unknown scope: {name}")))?;
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        if scopes.is_empty() {
            return Err(Error::validation("at least one scope is required"));
        }

        let raw_key = generate_raw_key();
        let secret_part = &raw_key[API_KEY_PREFIX.len()..];
        let record = ApiKey {
            id: Uuid::new_v4(),
            org_id,
            key_hash: self.digest(&raw_key),
            key_prefix: secret_part[..API_KEY_ID_PREFIX_LEN].to_string(),
            scopes,
            active: true,
            expires_at,
            created_at: Utc::now(),
        };
        let record = self.keys.insert_api_key(record).await?;
        Ok(IssuedKey { record, raw_key })
    }

    /// HMAC-SHA256 digest of a raw key under the server secret, hex encoded
    fn digest(&self, raw_key: &str) -> String {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.hash_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(raw_key.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// Generate a raw tenant key: `ce_` + 64 lowercase hex chars
fn generate_raw_key() -> String {
    let mut bytes = [0u8; API_KEY_HEX_LEN / 2];
    rand::rng().fill_bytes(&mut bytes);
    format!("{API_KEY_PREFIX}{}", hex::encode(bytes))
}

/// Constant-time comparison for credential material
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct KeyTable {
        rows: Mutex<Vec<ApiKey>>,
    }

    #[async_trait]
    impl ApiKeyStore for KeyTable {
        async fn insert_api_key(&self, key: ApiKey) -> Result<ApiKey> {
            let mut rows = self.rows.lock().unwrap();
            if rows.iter().any(|r| r.key_hash == key.key_hash) {
                return Err(Error::conflict("duplicate key digest"));
            }
            rows.push(key.clone());
            Ok(key)
        }

        async fn find_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|r| r.key_hash == key_hash).cloned())
        }

        async fn list_api_keys(&self, org_id: Uuid) -> Result<Vec<ApiKey>> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().filter(|r| r.org_id == org_id).cloned().collect())
        }

        async fn revoke_api_key(&self, org_id: Uuid, key_id: Uuid) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            match rows
                .iter_mut()
                .find(|r| r.org_id == org_id && r.id == key_id)
            {
                Some(row) => {
                    row.active = false;
                    Ok(())
                }
                None => Err(Error::not_found("api key")),
            }
        }
    }

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(KeyTable::default()),
            "test-secret".to_string(),
            Some("cep_platform-token".to_string()),
        )
    }

    #[tokio::test]
    async fn issued_key_round_trips_through_validation() {
        let svc = service();
        let org = Uuid::new_v4();
        let issued = svc
            .issue_key(org, &["component:read".to_string()], None)
            .await
            .unwrap();

        assert!(issued.raw_key.starts_with("ce_"));
        assert_eq!(issued.raw_key.len(), 3 + 64);
        assert_eq!(issued.record.key_prefix.len(), 8);

        let ctx = svc.validate_token(&issued.raw_key).await.unwrap();
        match ctx {
            AuthContext::Tenant(t) => {
                assert_eq!(t.org_id, org);
                assert_eq!(t.scopes, vec![Scope::ComponentRead]);
            }
            AuthContext::Platform(_) => panic!("expected tenant context"),
        }
    }

    #[tokio::test]
    async fn platform_prefix_wins_over_tenant_lookup() {
        let svc = service();
        let ctx = svc.validate_token("cep_platform-token").await.unwrap();
        assert!(ctx.is_platform());
        assert!(svc.validate_token("cep_wrong").await.is_err());
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected() {
        let svc = service();
        assert!(svc.validate_token("Bearer nope").await.is_err());
        assert!(svc.validate_token("ce_short").await.is_err());
        let unknown = format!("ce_{}", "0".repeat(64));
        assert!(svc.validate_token(&unknown).await.is_err());
    }

    #[tokio::test]
    async fn unknown_scopes_fail_key_issuance() {
        let svc = service();
        let err = svc
            .issue_key(Uuid::new_v4(), &["platform:admin".to_string()], None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn constant_time_eq_basics() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }
}

//! API key entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Scope;

/// A tenant API key record.
///
/// Only the HMAC-SHA256 digest of the raw key is stored; the raw key exists
/// only at creation time and is returned to the caller exactly once. The
/// 8-character prefix identifies the key in listings without revealing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    /// Stable identifier
    pub id: Uuid,
    /// Owning organization
    pub org_id: Uuid,
    /// HMAC-SHA256 digest of the raw key, hex encoded
    pub key_hash: String,
    /// First 8 hex characters after the `ce_` prefix
    pub key_prefix: String,
    /// Granted tenant scopes
    pub scopes: Vec<Scope>,
    /// Whether the key is currently usable
    pub active: bool,
    /// Optional expiry; expired keys fail validation
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    /// Whether the key is active and unexpired at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.is_none_or(|exp| exp > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn key(active: bool, expires_at: Option<DateTime<Utc>>) -> ApiKey {
        ApiKey {
            id: Uuid::new_v4(),
            org_id: Uuid::new_v4(),
            key_hash: "ab".repeat(32),
            key_prefix: "deadbeef".to_string(),
            scopes: vec![Scope::ComponentRead],
            active,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn inactive_key_is_invalid() {
        assert!(!key(false, None).is_valid_at(Utc::now()));
    }

    #[test]
    fn expired_key_is_invalid() {
        let past = Utc::now() - Duration::hours(1);
        assert!(!key(true, Some(past)).is_valid_at(Utc::now()));
        let future = Utc::now() + Duration::hours(1);
        assert!(key(true, Some(future)).is_valid_at(Utc::now()));
    }
}

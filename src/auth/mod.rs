//! API key issuance and validation (SPEC_FULL.md §10.5, §4.4).
//!
//! Tokens are never stored; only their SHA-256 hash is, following the same
//! `hash_api_key` shape as the crypto helpers this module is modeled on.

use crate::domain::ApiKey;
use crate::error::{OrchestratorError, Result};
use crate::store::StateStore;
use base64::{Engine as _, engine::general_purpose};
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Prefix every issued token carries, so malformed/foreign bearer tokens can
/// be rejected before a store lookup.
pub const API_KEY_PREFIX: &str = "dio-";

/// The authenticated identity attached to a request's extensions by
/// [`crate::server::middleware::BearerAuth`].
#[derive(Debug, Clone)]
pub struct ApiKeyPrincipal {
    /// The key owner's email, as recorded at `create_key` time.
    pub email: String,
}

/// A freshly minted token, returned exactly once at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedKey {
    /// The raw bearer token. Not retrievable again after this call returns.
    pub token: String,
    /// The persisted record (hash only).
    pub record: ApiKey,
}

/// Issuance and validation of bearer API keys.
pub struct AuthSystem {
    store: Arc<dyn StateStore>,
}

impl AuthSystem {
    /// Build an auth system over `store`.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// SHA-256 hex digest of `token`, the only form ever persisted.
    pub fn hash_api_key(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Mint a new key for `email`/`name`: 24 random bytes, URL-safe base64,
    /// prefixed `dio-`.
    pub async fn create_key(&self, email: &str, name: &str, now: i64) -> Result<IssuedKey> {
        if email.is_empty() || name.is_empty() {
            return Err(OrchestratorError::InvalidInput(
                "email and name must not be empty".to_string(),
            ));
        }

        let mut bytes = [0u8; 24];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = format!("{API_KEY_PREFIX}{}", general_purpose::URL_SAFE_NO_PAD.encode(bytes));
        let record = ApiKey {
            key_hash: Self::hash_api_key(&token),
            email: email.to_string(),
            name: name.to_string(),
            created_at: now,
            last_used_at: now,
        };
        self.store.put_api_key(record.clone()).await?;
        Ok(IssuedKey { token, record })
    }

    /// Validate a bearer token, bumping `last_used_at` on success.
    pub async fn validate_api_key(&self, token: &str, now: i64) -> Result<ApiKey> {
        if !token.starts_with(API_KEY_PREFIX) {
            return Err(OrchestratorError::Unauthorized);
        }
        let hash = Self::hash_api_key(token);
        let key = self
            .store
            .get_api_key(&hash)
            .await?
            .ok_or(OrchestratorError::Unauthorized)?;
        self.store.update_api_key_last_used(&hash, now).await?;
        Ok(ApiKey { last_used_at: now, ..key })
    }

    /// Keys owned by `email`, newest first. Raw tokens are never returned,
    /// since they are never stored.
    pub async fn list_keys(&self, email: &str) -> Result<Vec<ApiKey>> {
        let mut keys = self.store.list_api_keys(email).await?;
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    /// Revoke `key_hash`, but only if it is owned by `email`. A no-op (not
    /// an error) if the key doesn't exist or belongs to someone else, so
    /// callers can't probe for other users' key ids.
    pub async fn delete_key(&self, email: &str, key_hash: &str) -> Result<()> {
        if let Some(key) = self.store.get_api_key(key_hash).await? {
            if key.email == email {
                self.store.delete_api_key(key_hash).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStateStore;

    fn auth() -> AuthSystem {
        AuthSystem::new(Arc::new(MemoryStateStore::new()))
    }

    #[tokio::test]
    async fn created_keys_carry_the_prefix_and_validate() {
        let auth = auth();
        let issued = auth.create_key("a@example.com", "laptop", 1_000).await.unwrap();
        assert!(issued.token.starts_with(API_KEY_PREFIX));

        let validated = auth.validate_api_key(&issued.token, 1_050).await.unwrap();
        assert_eq!(validated.email, "a@example.com");
        assert_eq!(validated.last_used_at, 1_050);
    }

    #[tokio::test]
    async fn validation_rejects_wrong_prefix_and_unknown_hash() {
        let auth = auth();
        assert!(matches!(
            auth.validate_api_key("sk-not-ours", 1_000).await.unwrap_err(),
            OrchestratorError::Unauthorized
        ));
        assert!(matches!(
            auth.validate_api_key("dio-unknowntoken", 1_000).await.unwrap_err(),
            OrchestratorError::Unauthorized
        ));
    }

    #[tokio::test]
    async fn delete_key_is_a_noop_for_a_non_owner() {
        let auth = auth();
        let issued = auth.create_key("a@example.com", "laptop", 1_000).await.unwrap();

        auth.delete_key("b@example.com", &issued.record.key_hash).await.unwrap();
        assert!(auth.validate_api_key(&issued.token, 1_000).await.is_ok());

        auth.delete_key("a@example.com", &issued.record.key_hash).await.unwrap();
        assert!(auth.validate_api_key(&issued.token, 1_000).await.is_err());
    }

    #[tokio::test]
    async fn list_keys_orders_newest_first() {
        let auth = auth();
        auth.create_key("a@example.com", "first", 1_000).await.unwrap();
        auth.create_key("a@example.com", "second", 2_000).await.unwrap();

        let keys = auth.list_keys("a@example.com").await.unwrap();
        assert_eq!(keys[0].name, "second");
        assert_eq!(keys[1].name, "first");
    }
}

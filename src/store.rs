//! Token store contract and the two bundled implementations.
//!
//! The engine only ever reads from a store. Which lookup the engine uses —
//! plain secret, or two-factor `client_id` + hashed secret — is decided by
//! `EngineConfig::two_factor`, not by the store.

use crate::config::EngineConfig;
use crate::error::ZonegateResult;
use crate::permissions::TokenRecord;
use std::collections::HashMap;
use std::sync::RwLock;

/// Read-only token lookup used by the access control engine.
pub trait TokenStore: Send + Sync {
    /// Look up a token by its opaque secret.
    fn find_by_secret(&self, secret: &str) -> ZonegateResult<Option<TokenRecord>>;

    /// Look up a token by its public client id (two-factor mode).
    fn find_by_client_id(&self, client_id: &str) -> ZonegateResult<Option<TokenRecord>>;
}

/// Immutable store built from a static configuration file.
pub struct StaticTokenStore {
    by_secret: HashMap<String, TokenRecord>,
}

impl StaticTokenStore {
    /// Build the store from the tokens declared in a config.
    pub fn from_config(config: &EngineConfig) -> Self {
        let by_secret = config
            .tokens
            .iter()
            .map(|t| (t.secret.clone(), t.record.clone()))
            .collect();
        Self { by_secret }
    }
}

impl TokenStore for StaticTokenStore {
    fn find_by_secret(&self, secret: &str) -> ZonegateResult<Option<TokenRecord>> {
        Ok(self.by_secret.get(secret).cloned())
    }

    fn find_by_client_id(&self, _client_id: &str) -> ZonegateResult<Option<TokenRecord>> {
        Ok(None)
    }
}

/// Mutable in-memory store. Stands in for the external persisted store
/// behind the same trait; the administrative layer writes, the engine reads.
pub struct MemoryTokenStore {
    by_secret: RwLock<HashMap<String, TokenRecord>>,
    by_client_id: RwLock<HashMap<String, TokenRecord>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self {
            by_secret: RwLock::new(HashMap::new()),
            by_client_id: RwLock::new(HashMap::new()),
        }
    }

    /// Register a token under its plaintext secret (single-factor mode).
    pub fn insert(&self, secret: impl Into<String>, record: TokenRecord) {
        self.by_secret
            .write()
            .expect("token store lock poisoned")
            .insert(secret.into(), record);
    }

    /// Register a two-factor token under its client id. The record must
    /// already carry its credential pair.
    pub fn insert_two_factor(&self, record: TokenRecord) {
        if let Some(client_id) = record.client_id.clone() {
            self.by_client_id
                .write()
                .expect("token store lock poisoned")
                .insert(client_id, record);
        } else {
            log::warn!("ignoring two-factor token {} without client_id", record.id);
        }
    }

    /// Remove every token with the given record id.
    pub fn remove(&self, id: &str) {
        self.by_secret
            .write()
            .expect("token store lock poisoned")
            .retain(|_, record| record.id != id);
        self.by_client_id
            .write()
            .expect("token store lock poisoned")
            .retain(|_, record| record.id != id);
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for MemoryTokenStore {
    fn find_by_secret(&self, secret: &str) -> ZonegateResult<Option<TokenRecord>> {
        Ok(self
            .by_secret
            .read()
            .expect("token store lock poisoned")
            .get(secret)
            .cloned())
    }

    fn find_by_client_id(&self, client_id: &str) -> ZonegateResult<Option<TokenRecord>> {
        Ok(self
            .by_client_id
            .read()
            .expect("token store lock poisoned")
            .get(client_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::TokenScope;

    #[test]
    fn test_static_store_lookup() {
        let config = EngineConfig::new().with_token(
            "secret-1",
            TokenRecord::new("t1", "test", TokenScope::empty()),
        );
        let store = StaticTokenStore::from_config(&config);
        assert!(store.find_by_secret("secret-1").unwrap().is_some());
        assert!(store.find_by_secret("other").unwrap().is_none());
        assert!(store.find_by_client_id("t1").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        store.insert("secret-1", TokenRecord::new("t1", "test", TokenScope::empty()));
        assert!(store.find_by_secret("secret-1").unwrap().is_some());
        store.remove("t1");
        assert!(store.find_by_secret("secret-1").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_two_factor_index() {
        let store = MemoryTokenStore::new();
        let record = TokenRecord::new("t1", "test", TokenScope::empty())
            .with_credentials("client-1", "s3cret");
        store.insert_two_factor(record);

        let found = store.find_by_client_id("client-1").unwrap().unwrap();
        assert!(found.verify_secret("s3cret"));
        assert!(store.find_by_client_id("client-2").unwrap().is_none());
    }

    #[test]
    fn test_two_factor_insert_requires_client_id() {
        let store = MemoryTokenStore::new();
        store.insert_two_factor(TokenRecord::new("t1", "test", TokenScope::empty()));
        assert!(store.find_by_client_id("t1").unwrap().is_none());
    }
}

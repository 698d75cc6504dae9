//! Token records and the read-only projection the engine hands out.

use crate::permissions::{PermissionError, TokenScope};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

fn default_true() -> bool {
    true
}

/// A DNS control-panel operation a token can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read" => Ok(Operation::Read),
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            other => Err(PermissionError::UnknownOperation(other.to_string())),
        }
    }
}

/// A credential and its bound permission scope, as the engine reads it from
/// the backing store. Created and edited only by the administrative layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Stable identifier, used for audit references. Never the secret.
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Public half of a two-factor credential. Unique within a store.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Hex-encoded SHA-256 of the secret half, two-factor mode only.
    #[serde(default)]
    pub secret_hash: Option<String>,
    pub scope: TokenScope,
    /// Origin patterns (IP, CIDR, or hostname glob). Empty means the token
    /// is not origin-restricted.
    #[serde(default)]
    pub origins: Vec<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Unix timestamp after which the token behaves as if it did not exist.
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Emit a security notification when this token is denied an operation.
    #[serde(default)]
    pub notify_on_denial: bool,
}

impl TokenRecord {
    pub fn new(id: impl Into<String>, description: impl Into<String>, scope: TokenScope) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            client_id: None,
            secret_hash: None,
            scope,
            origins: Vec::new(),
            active: true,
            expires_at: None,
            notify_on_denial: false,
        }
    }

    /// Restrict the token to a list of origin patterns.
    pub fn with_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// Set an expiry timestamp.
    pub fn with_expiration(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Attach a two-factor credential pair. The secret is stored hashed.
    pub fn with_credentials(mut self, client_id: impl Into<String>, secret: &str) -> Self {
        self.client_id = Some(client_id.into());
        self.secret_hash = Some(hash_secret(secret));
        self
    }

    /// Request denial notifications for this token.
    pub fn with_denial_notification(mut self) -> Self {
        self.notify_on_denial = true;
        self
    }

    /// Active and unexpired. Expired or disabled tokens are reported to
    /// callers as not found, never as "found but unusable".
    pub fn is_valid(&self) -> bool {
        if !self.active {
            return false;
        }
        if let Some(expires_at) = self.expires_at {
            return chrono::Utc::now().timestamp() < expires_at;
        }
        true
    }

    /// Constant-time comparison of a presented secret against the stored
    /// hash. False when the record carries no credential.
    pub fn verify_secret(&self, presented: &str) -> bool {
        let Some(stored) = &self.secret_hash else {
            return false;
        };
        let digest = hash_secret(presented);
        ring::constant_time::verify_slices_are_equal(digest.as_bytes(), stored.as_bytes()).is_ok()
    }

    /// Read-only projection for callers. Carries no secret material.
    pub fn info(&self) -> TokenInfo {
        TokenInfo {
            id: self.id.clone(),
            description: self.description.clone(),
            scope: self.scope.clone(),
            origins: self.origins.clone(),
            expires_at: self.expires_at,
            notify_on_denial: self.notify_on_denial,
        }
    }
}

/// Hash a token secret for storage. Hex-encoded SHA-256.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Read-only view of a token the engine exposes to the surrounding service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub id: String,
    pub description: String,
    pub scope: TokenScope,
    pub origins: Vec<String>,
    pub expires_at: Option<i64>,
    pub notify_on_denial: bool,
}

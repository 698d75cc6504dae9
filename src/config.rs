//! Engine configuration.
//!
//! The engine is constructed from an explicit `EngineConfig` value; there is
//! no process-wide configuration state. In static mode the config also
//! declares the token set, which `StaticTokenStore` loads at startup.

use crate::error::{ZonegateError, ZonegateResult};
use crate::permissions::TokenRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_max_audit_entries() -> usize {
    1000
}

/// A token declared in a static configuration file: the plaintext secret
/// callers present, plus the record bound to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticToken {
    pub secret: String,
    #[serde(flatten)]
    pub record: TokenRecord,
}

/// Configuration for an `AccessControlEngine` and its collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Expect `client_id:secret_key` credentials instead of opaque secrets.
    #[serde(default)]
    pub two_factor: bool,
    /// Retention cap for the in-memory audit sink.
    #[serde(default = "default_max_audit_entries")]
    pub max_audit_entries: usize,
    /// Tokens for static (config-file) operation. Empty when a persisted
    /// store supplies tokens instead.
    #[serde(default)]
    pub tokens: Vec<StaticToken>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            two_factor: false,
            max_audit_entries: default_max_audit_entries(),
            tokens: Vec::new(),
        }
    }

    /// Enable or disable two-factor token presentation.
    pub fn with_two_factor(mut self, two_factor: bool) -> Self {
        self.two_factor = two_factor;
        self
    }

    /// Set the audit retention cap.
    pub fn with_max_audit_entries(mut self, max_audit_entries: usize) -> Self {
        self.max_audit_entries = max_audit_entries;
        self
    }

    /// Declare a static token.
    pub fn with_token(mut self, secret: impl Into<String>, record: TokenRecord) -> Self {
        self.tokens.push(StaticToken {
            secret: secret.into(),
            record,
        });
        self
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> ZonegateResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ZonegateResult<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ZonegateError::Config(format!(
                "cannot read {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
two_factor = false
max_audit_entries = 50

[[tokens]]
secret = "s3cret-token"
id = "t1"
description = "web servers"
origins = ["10.0.0.0/24"]

[tokens.scope]
mode = "rule_list"

[[tokens.scope.rules]]
domain = "example.com"
record_name = "web*"
record_types = ["A"]
operations = ["read", "update"]
"#;

    #[test]
    fn test_parse_toml() {
        let config = EngineConfig::from_toml_str(SAMPLE).unwrap();
        assert!(!config.two_factor);
        assert_eq!(config.max_audit_entries, 50);
        assert_eq!(config.tokens.len(), 1);

        let token = &config.tokens[0];
        assert_eq!(token.secret, "s3cret-token");
        assert_eq!(token.record.id, "t1");
        assert_eq!(token.record.origins, vec!["10.0.0.0/24"]);
        assert!(token.record.active);
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert!(!config.two_factor);
        assert_eq!(config.max_audit_entries, 1000);
        assert!(config.tokens.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.tokens.len(), 1);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let err = EngineConfig::from_toml_str("tokens = 3").unwrap_err();
        assert!(matches!(err, ZonegateError::Config(_)));
    }
}

//! DNS record types, structural name validation, and the upstream client
//! contract.
//!
//! The upstream DNS provider API is a black box invoked only after
//! authorization succeeds; its failures are upstream errors, never
//! authorization facts.

use crate::error::ZonegateResult;
use crate::permissions::Operation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Maximum length of a domain name, per RFC 1035.
pub const MAX_DOMAIN_LEN: usize = 253;

const MAX_LABEL_LEN: usize = 63;

/// One record as returned by the upstream control-panel API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Upstream record identifier, if the record already exists.
    #[serde(default)]
    pub id: Option<u64>,
    /// Record name relative to the zone (empty or `@` for the apex).
    pub hostname: String,
    /// Record type, e.g. `A`, `AAAA`, `TXT`.
    pub record_type: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub priority: Option<u16>,
}

fn default_ttl() -> u32 {
    3600
}

/// One requested record mutation in a batch update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate {
    /// Identifier of an existing record; present for updates and deletes.
    #[serde(default)]
    pub id: Option<u64>,
    pub hostname: String,
    pub record_type: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub priority: Option<u16>,
    /// Set to remove the record instead of writing it.
    #[serde(default)]
    pub delete: bool,
}

impl RecordUpdate {
    /// The operation this mutation amounts to: delete when flagged, update
    /// when it targets an existing record, create otherwise.
    pub fn operation(&self) -> Operation {
        if self.delete {
            Operation::Delete
        } else if self.id.is_some() {
            Operation::Update
        } else {
            Operation::Create
        }
    }
}

/// Result summary of an applied batch update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub applied: usize,
}

/// Structural validation of a fully-qualified domain name: length cap and
/// RFC-1035-shaped labels. Rejected input never reaches permission logic.
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return false;
    }
    domain.split('.').all(is_valid_label)
}

/// Validation for record names within a zone. Allows the apex forms (empty
/// string or `@`) and a leading `*.` wildcard label on top of the domain
/// label rules.
pub fn is_valid_record_name(name: &str) -> bool {
    if name.is_empty() || name == "@" || name == "*" {
        return true;
    }
    if name.len() > MAX_DOMAIN_LEN {
        return false;
    }
    let rest = name.strip_prefix("*.").unwrap_or(name);
    rest.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !label.starts_with('-')
        && !label.ends_with('-')
}

/// Upstream DNS provider client, implemented by the surrounding service.
/// Called only with already-authorized requests.
#[async_trait]
pub trait DnsClient: Send + Sync {
    async fn list_records(&self, domain: &str) -> ZonegateResult<Vec<DnsRecord>>;

    async fn apply_updates(
        &self,
        domain: &str,
        updates: &[RecordUpdate],
    ) -> ZonegateResult<UpdateOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_validation() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("sub.example.com"));
        assert!(is_valid_domain("xn--nxasmq6b.example"));
        assert!(!is_valid_domain(""));
        assert!(!is_valid_domain(&format!("{}.com", "a".repeat(250))));
        assert!(!is_valid_domain("exa mple.com"));
        assert!(!is_valid_domain("-leading.example.com"));
        assert!(!is_valid_domain("trailing-.example.com"));
        assert!(!is_valid_domain("double..dot.com"));
        assert!(!is_valid_domain(&format!("{}.com", "a".repeat(64))));
    }

    #[test]
    fn test_record_name_validation() {
        assert!(is_valid_record_name(""));
        assert!(is_valid_record_name("@"));
        assert!(is_valid_record_name("*"));
        assert!(is_valid_record_name("www"));
        assert!(is_valid_record_name("*.dyn"));
        assert!(is_valid_record_name("a.b"));
        assert!(!is_valid_record_name("bad name"));
        assert!(!is_valid_record_name("-bad"));
    }

    #[test]
    fn test_inferred_operations() {
        let update = RecordUpdate {
            id: None,
            hostname: "www".to_string(),
            record_type: "A".to_string(),
            content: "192.0.2.1".to_string(),
            ttl: 3600,
            priority: None,
            delete: false,
        };
        assert_eq!(update.operation(), Operation::Create);

        let mut existing = update.clone();
        existing.id = Some(42);
        assert_eq!(existing.operation(), Operation::Update);

        let mut removal = existing.clone();
        removal.delete = true;
        assert_eq!(removal.operation(), Operation::Delete);
    }
}

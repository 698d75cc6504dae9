//! Fine-grained permission rules for rule-list token scopes.

use crate::pattern::{self, PatternKind};
use crate::permissions::Operation;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_wildcard() -> String {
    "*".to_string()
}

fn default_wildcard_set() -> HashSet<String> {
    let mut set = HashSet::new();
    set.insert("*".to_string());
    set
}

/// One scoping rule: which domains, record names, record types, and
/// operations a token may touch.
///
/// Rules are evaluated in the order an administrator stored them; a rule
/// grants access only when every dimension it constrains is satisfied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionRule {
    /// Domain glob the rule applies to.
    pub domain: String,
    /// Record-name glob; defaults to `*` (any record).
    #[serde(default = "default_wildcard")]
    pub record_name: String,
    /// Allowed record types; `*` means all.
    #[serde(default = "default_wildcard_set")]
    pub record_types: HashSet<String>,
    /// Allowed operations out of read/create/update/delete; `*` means all.
    #[serde(default = "default_wildcard_set")]
    pub operations: HashSet<String>,
}

impl PermissionRule {
    /// Create a rule scoped to a domain glob, open on every other dimension.
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            record_name: default_wildcard(),
            record_types: default_wildcard_set(),
            operations: default_wildcard_set(),
        }
    }

    /// Restrict the rule to records matching a name glob.
    pub fn with_record_name(mut self, record_name: impl Into<String>) -> Self {
        self.record_name = record_name.into();
        self
    }

    /// Restrict the rule to a set of record types.
    pub fn with_record_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict the rule to a set of operations.
    pub fn with_operations<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operations = operations.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this rule grants `action` on `domain` for the given record.
    ///
    /// A `None` record name is a zone-level request: the rule grants on
    /// domain and operation alone. An unsafe domain or record-name pattern
    /// makes the corresponding check fail, so a misconfigured rule can never
    /// widen access.
    pub fn allows(
        &self,
        action: Operation,
        domain: &str,
        record_name: Option<&str>,
        record_type: Option<&str>,
    ) -> bool {
        if !pattern::matches(domain, &self.domain, PatternKind::Domain) {
            return false;
        }
        if !self.allows_operation(action) {
            return false;
        }
        let Some(name) = record_name else {
            return true;
        };
        if !pattern::matches(name, &self.record_name, PatternKind::Domain) {
            return false;
        }
        match record_type {
            Some(rtype) => self.allows_record_type(rtype),
            None => true,
        }
    }

    /// Whether the rule permits an operation.
    pub fn allows_operation(&self, action: Operation) -> bool {
        self.operations.contains("*") || self.operations.contains(action.as_str())
    }

    /// Whether the rule permits a record type (case-insensitive).
    pub fn allows_record_type(&self, rtype: &str) -> bool {
        self.record_types.contains("*")
            || self
                .record_types
                .iter()
                .any(|t| t.eq_ignore_ascii_case(rtype))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_grant_everything_on_domain() {
        let rule = PermissionRule::new("example.com");
        assert!(rule.allows(Operation::Read, "example.com", None, None));
        assert!(rule.allows(Operation::Delete, "example.com", Some("www"), Some("A")));
        assert!(!rule.allows(Operation::Read, "other.com", None, None));
    }

    #[test]
    fn test_operation_restriction() {
        let rule = PermissionRule::new("example.com").with_operations(["read", "update"]);
        assert!(rule.allows(Operation::Read, "example.com", Some("www"), Some("A")));
        assert!(rule.allows(Operation::Update, "example.com", Some("www"), Some("A")));
        assert!(!rule.allows(Operation::Delete, "example.com", Some("www"), Some("A")));
        assert!(!rule.allows(Operation::Create, "example.com", Some("www"), Some("A")));
    }

    #[test]
    fn test_record_name_glob() {
        let rule = PermissionRule::new("example.com").with_record_name("web*");
        assert!(rule.allows(Operation::Read, "example.com", Some("web1"), Some("A")));
        assert!(!rule.allows(Operation::Read, "example.com", Some("db1"), Some("A")));
        // Zone-level requests do not consult the record-name pattern.
        assert!(rule.allows(Operation::Read, "example.com", None, None));
    }

    #[test]
    fn test_record_type_case_insensitive() {
        let rule = PermissionRule::new("example.com").with_record_types(["A", "AAAA"]);
        assert!(rule.allows(Operation::Read, "example.com", Some("www"), Some("a")));
        assert!(!rule.allows(Operation::Read, "example.com", Some("www"), Some("TXT")));
    }

    #[test]
    fn test_unsafe_domain_pattern_never_grants() {
        let rule = PermissionRule::new("a".repeat(200));
        assert!(!rule.allows(Operation::Read, "example.com", None, None));
        let rule = PermissionRule::new("(evil");
        assert!(!rule.allows(Operation::Read, "(evil", None, None));
    }

    #[test]
    fn test_serde_defaults() {
        let rule: PermissionRule = serde_json::from_str(r#"{"domain": "example.com"}"#).unwrap();
        assert_eq!(rule.record_name, "*");
        assert!(rule.record_types.contains("*"));
        assert!(rule.operations.contains("*"));
    }
}

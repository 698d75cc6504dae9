//! Token scope shapes and the shared authorization decision they produce.

use crate::pattern::{self, RealmType};
use crate::permissions::{Operation, PermissionRule};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_wildcard_set() -> HashSet<String> {
    let mut set = HashSet::new();
    set.insert("*".to_string());
    set
}

/// The permission shape bound to a token.
///
/// A store operates in exactly one mode, so an engine instance only ever
/// sees one of the two variants; the tagged union keeps the engine free of
/// mode branching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TokenScope {
    /// Ordered list of fine-grained rules, scanned first-satisfied-wins.
    RuleList { rules: Vec<PermissionRule> },
    /// The whole token is bound to one host or subdomain family plus flat
    /// allowed-type/operation sets. No record-name granularity.
    SingleRealm {
        realm_type: RealmType,
        realm_value: String,
        #[serde(default = "default_wildcard_set")]
        allowed_record_types: HashSet<String>,
        #[serde(default = "default_wildcard_set")]
        allowed_operations: HashSet<String>,
    },
}

/// Outcome of a single authorization check. Produced fresh per check and
/// never cached: permissions can change between requests.
#[derive(Debug, Clone)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    /// Index of the satisfying rule in rule-list mode.
    pub matched_rule: Option<usize>,
    /// Audit-only explanation; never returned to callers.
    pub reason: String,
}

impl AuthorizationDecision {
    pub fn allow(matched_rule: Option<usize>, reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            matched_rule,
            reason: reason.into(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            matched_rule: None,
            reason: reason.into(),
        }
    }
}

impl TokenScope {
    /// Scope covering nothing. Useful as a safe placeholder.
    pub fn empty() -> Self {
        TokenScope::RuleList { rules: Vec::new() }
    }

    /// Whether this scope grants `action` on `domain` for the given record.
    pub fn authorize(
        &self,
        action: Operation,
        domain: &str,
        record_name: Option<&str>,
        record_type: Option<&str>,
    ) -> bool {
        self.decide(action, domain, record_name, record_type).allowed
    }

    /// Full decision walk, with the matched rule and an audit reason.
    ///
    /// Rule-list evaluation scans every rule in stored order and returns on
    /// the first rule that satisfies all dimensions. A rule that matches the
    /// domain but fails the operation or record checks does not stop the
    /// scan. No rule satisfied means deny.
    pub fn decide(
        &self,
        action: Operation,
        domain: &str,
        record_name: Option<&str>,
        record_type: Option<&str>,
    ) -> AuthorizationDecision {
        match self {
            TokenScope::RuleList { rules } => {
                for (index, rule) in rules.iter().enumerate() {
                    if rule.allows(action, domain, record_name, record_type) {
                        return AuthorizationDecision::allow(
                            Some(index),
                            format!("granted by rule {index}"),
                        );
                    }
                }
                AuthorizationDecision::deny(format!("no rule grants {action} on {domain}"))
            }
            TokenScope::SingleRealm {
                realm_type,
                realm_value,
                allowed_record_types,
                allowed_operations,
            } => {
                if !pattern::matches_realm(domain, *realm_type, realm_value) {
                    return AuthorizationDecision::deny(format!("{domain} is outside the realm"));
                }
                if !set_allows(allowed_operations, action.as_str()) {
                    return AuthorizationDecision::deny(format!("{action} not permitted in realm"));
                }
                if let Some(rtype) = record_type {
                    if !set_allows(allowed_record_types, rtype) {
                        return AuthorizationDecision::deny(format!(
                            "record type {rtype} not permitted in realm"
                        ));
                    }
                }
                AuthorizationDecision::allow(None, "granted by realm scope")
            }
        }
    }
}

fn set_allows(set: &HashSet<String>, value: &str) -> bool {
    set.contains("*") || set.iter().any(|v| v.eq_ignore_ascii_case(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn realm_scope() -> TokenScope {
        TokenScope::SingleRealm {
            realm_type: RealmType::Subdomain,
            realm_value: "value.com".to_string(),
            allowed_record_types: ["A", "AAAA"].iter().map(|s| s.to_string()).collect(),
            allowed_operations: ["read", "update"].iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_rule_list_denies_everything() {
        let scope = TokenScope::empty();
        for action in [
            Operation::Read,
            Operation::Create,
            Operation::Update,
            Operation::Delete,
        ] {
            assert!(!scope.authorize(action, "example.com", None, None));
            assert!(!scope.authorize(action, "example.com", Some("www"), Some("A")));
        }
    }

    #[test]
    fn test_rule_list_continues_past_partial_matches() {
        // Rule 0 matches domain+record but not the operation; rule 1 grants
        // everything. A delete must reach rule 1.
        let scope = TokenScope::RuleList {
            rules: vec![
                PermissionRule::new("example.com")
                    .with_record_name("host1")
                    .with_operations(["read"]),
                PermissionRule::new("example.com"),
            ],
        };
        let decision = scope.decide(Operation::Delete, "example.com", Some("host1"), Some("A"));
        assert!(decision.allowed);
        assert_eq!(decision.matched_rule, Some(1));
    }

    #[test]
    fn test_rule_list_denies_when_no_rule_satisfies() {
        let scope = TokenScope::RuleList {
            rules: vec![PermissionRule::new("example.com")
                .with_record_name("host1")
                .with_operations(["read"])],
        };
        let decision = scope.decide(Operation::Delete, "example.com", Some("host1"), Some("A"));
        assert!(!decision.allowed);
        assert!(decision.matched_rule.is_none());
    }

    #[test]
    fn test_realm_scope_checks_all_dimensions() {
        let scope = realm_scope();
        assert!(scope.authorize(Operation::Read, "sub.value.com", None, Some("A")));
        assert!(scope.authorize(Operation::Read, "value.com", None, None));
        assert!(!scope.authorize(Operation::Delete, "value.com", None, Some("A")));
        assert!(!scope.authorize(Operation::Read, "value.com", None, Some("TXT")));
        assert!(!scope.authorize(Operation::Read, "evilvalue.com", None, Some("A")));
    }

    #[test]
    fn test_realm_scope_ignores_record_name() {
        // Single-realm mode has no record-name granularity.
        let scope = realm_scope();
        assert!(scope.authorize(Operation::Read, "value.com", Some("anything"), Some("A")));
    }

    #[test]
    fn test_scope_serde_round_trip() {
        let json = r#"{"mode": "single_realm", "realm_type": "subdomain", "realm_value": "value.com"}"#;
        let scope: TokenScope = serde_json::from_str(json).unwrap();
        assert!(scope.authorize(Operation::Delete, "sub.value.com", None, None));

        let json = r#"{"mode": "rule_list", "rules": [{"domain": "example.com"}]}"#;
        let scope: TokenScope = serde_json::from_str(json).unwrap();
        assert!(scope.authorize(Operation::Read, "example.com", None, None));
    }
}

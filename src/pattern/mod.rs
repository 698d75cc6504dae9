//! Safe wildcard and network pattern matching for domains, record names,
//! record types, and request origins.
//!
//! Every pattern passes a restrictive character-set and length gate before
//! any matching logic runs. The gate is the actual security control: it keeps
//! attacker-influenced configuration from ever reaching an engine that could
//! backtrack catastrophically.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

/// Maximum accepted pattern length. Anything longer is rejected outright.
pub const MAX_PATTERN_LEN: usize = 100;

/// The two matching modes a pattern can be evaluated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// Case-insensitive shell glob over domain-shaped strings.
    Domain,
    /// Exact IP or CIDR range, falling back to domain glob for hostnames.
    Network,
}

/// Realm scoping for single-realm tokens. Stricter than a glob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealmType {
    /// Exact host match only.
    Host,
    /// The realm domain itself or any label-delimited subdomain of it.
    Subdomain,
}

/// Check a pattern against the allow-listed character set and length cap.
///
/// Runs before any wildcard or CIDR logic. Patterns that fail are treated
/// as if they matched nothing.
pub fn is_safe(pattern: &str) -> bool {
    if pattern.len() > MAX_PATTERN_LEN {
        return false;
    }
    pattern
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '/' | '*'))
}

/// Match a candidate string against a pattern.
///
/// Never panics; any malformed input yields `false`. An unsafe pattern is
/// logged once per call and denied.
pub fn matches(candidate: &str, pattern: &str, kind: PatternKind) -> bool {
    if !is_safe(pattern) {
        log::warn!(
            "rejecting unsafe pattern ({} chars); treating as non-matching",
            pattern.len()
        );
        return false;
    }
    match kind {
        PatternKind::Domain => glob_match(candidate, pattern),
        PatternKind::Network => matches_network(candidate, pattern),
    }
}

/// Realm matching used by single-realm token scopes.
///
/// `Host` requires case-insensitive equality. `Subdomain` requires equality
/// or a `.`-delimited suffix match, so `evilvalue.com` never matches the
/// realm `value.com`.
pub fn matches_realm(domain: &str, realm_type: RealmType, value: &str) -> bool {
    let domain = domain.to_ascii_lowercase();
    let value = value.to_ascii_lowercase();
    match realm_type {
        RealmType::Host => domain == value,
        RealmType::Subdomain => domain == value || domain.ends_with(&format!(".{value}")),
    }
}

fn matches_network(candidate: &str, pattern: &str) -> bool {
    match candidate.parse::<IpAddr>() {
        Ok(ip) => {
            if pattern.contains('/') {
                cidr_contains(pattern, ip)
            } else {
                pattern
                    .parse::<IpAddr>()
                    .map(|p| p == ip)
                    .unwrap_or(false)
            }
        }
        // Origin lists mix IPs and hostnames; non-IP candidates are matched
        // as hostname globs against the same list.
        Err(_) => glob_match(candidate, pattern),
    }
}

/// Non-strict CIDR membership: host bits in the pattern may be set.
///
/// The pattern character set has no `:`, so only IPv4 networks can be
/// expressed.
fn cidr_contains(pattern: &str, ip: IpAddr) -> bool {
    let Some((net, prefix)) = pattern.split_once('/') else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u32>() else {
        return false;
    };
    let Ok(net) = net.parse::<Ipv4Addr>() else {
        return false;
    };
    let IpAddr::V4(ip) = ip else {
        return false;
    };
    if prefix > 32 {
        return false;
    }
    if prefix == 0 {
        return true;
    }
    let mask = u32::MAX << (32 - prefix);
    (u32::from(net) & mask) == (u32::from(ip) & mask)
}

/// Case-insensitive shell glob where `*` matches any run of characters
/// (including empty). `?` has no special meaning and matches only itself.
fn glob_match(candidate: &str, pattern: &str) -> bool {
    let cand: Vec<char> = candidate.to_ascii_lowercase().chars().collect();
    let pat: Vec<char> = pattern.to_ascii_lowercase().chars().collect();

    let mut c = 0;
    let mut p = 0;
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while c < cand.len() {
        if p < pat.len() && pat[p] != '*' && pat[p] == cand[c] {
            c += 1;
            p += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some(p);
            mark = c;
            p += 1;
        } else if let Some(sp) = star {
            // Backtrack: let the last star consume one more character.
            p = sp + 1;
            mark += 1;
            c = mark;
        } else {
            return false;
        }
    }
    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_gate_length() {
        let long = "a".repeat(200);
        assert!(!is_safe(&long));
        assert!(!matches("anything", &long, PatternKind::Domain));
        assert!(is_safe(&"a".repeat(100)));
    }

    #[test]
    fn test_safety_gate_charset() {
        assert!(is_safe("*.example.com"));
        assert!(is_safe("10.0.0.0/24"));
        assert!(is_safe("web_1-test"));
        assert!(!is_safe("a|b"));
        assert!(!is_safe("(a+)+"));
        assert!(!is_safe("host name"));
        assert!(!matches("a", "(a+)+", PatternKind::Domain));
    }

    #[test]
    fn test_glob_matching() {
        assert!(matches("web1.example.com", "web*", PatternKind::Domain));
        assert!(!matches("db1", "web*", PatternKind::Domain));
        assert!(matches("anything", "*", PatternKind::Domain));
        assert!(matches("", "*", PatternKind::Domain));
        assert!(matches("example.com", "example.com", PatternKind::Domain));
        assert!(matches("EXAMPLE.COM", "example.com", PatternKind::Domain));
        assert!(matches("a.b.c", "a.*.c", PatternKind::Domain));
        assert!(!matches("a.b.d", "a.*.c", PatternKind::Domain));
        assert!(matches("web12", "web*2", PatternKind::Domain));
    }

    #[test]
    fn test_question_mark_is_literal() {
        assert!(!matches("webX", "web?", PatternKind::Domain));
    }

    #[test]
    fn test_cidr_matching() {
        assert!(matches("10.0.0.50", "10.0.0.0/24", PatternKind::Network));
        assert!(!matches("10.0.1.1", "10.0.0.0/24", PatternKind::Network));
        // Host bits may be set in the pattern.
        assert!(matches("10.0.0.50", "10.0.0.1/24", PatternKind::Network));
        assert!(matches("192.168.5.1", "192.168.0.0/16", PatternKind::Network));
        assert!(matches("8.8.8.8", "0.0.0.0/0", PatternKind::Network));
        assert!(!matches("10.0.0.1", "10.0.0.0/33", PatternKind::Network));
    }

    #[test]
    fn test_exact_ip_matching() {
        assert!(matches("10.0.0.1", "10.0.0.1", PatternKind::Network));
        assert!(!matches("10.0.0.2", "10.0.0.1", PatternKind::Network));
    }

    #[test]
    fn test_network_hostname_fallthrough() {
        // Non-IP candidates fall back to hostname glob matching.
        assert!(matches("client.example.com", "*.example.com", PatternKind::Network));
        assert!(!matches("client.evil.com", "*.example.com", PatternKind::Network));
    }

    #[test]
    fn test_realm_host() {
        assert!(matches_realm("value.com", RealmType::Host, "value.com"));
        assert!(matches_realm("VALUE.com", RealmType::Host, "value.COM"));
        assert!(!matches_realm("sub.value.com", RealmType::Host, "value.com"));
    }

    #[test]
    fn test_realm_subdomain_dot_boundary() {
        assert!(matches_realm("value.com", RealmType::Subdomain, "value.com"));
        assert!(matches_realm("sub.value.com", RealmType::Subdomain, "value.com"));
        assert!(matches_realm("a.b.value.com", RealmType::Subdomain, "value.com"));
        assert!(!matches_realm("evilvalue.com", RealmType::Subdomain, "value.com"));
        assert!(!matches_realm("value.com.evil.com", RealmType::Subdomain, "value.com"));
    }
}

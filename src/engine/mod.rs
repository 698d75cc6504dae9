//! The access-control decision engine.
//!
//! A pure, synchronous decision function over the token store and the
//! current request's parameters. It holds no request-scoped mutable state,
//! caches no decisions, and resolves every ambiguous or failing condition
//! to deny. Safe to call concurrently from any number of request handlers.

use crate::config::EngineConfig;
use crate::dns::{DnsRecord, RecordUpdate};
use crate::pattern::{self, PatternKind};
use crate::permissions::{AuthorizationDecision, Operation, TokenInfo, TokenRecord};
use crate::store::TokenStore;
use std::sync::Arc;

pub struct AccessControlEngine {
    store: Arc<dyn TokenStore>,
    config: EngineConfig,
}

impl AccessControlEngine {
    pub fn new(config: EngineConfig, store: Arc<dyn TokenStore>) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether the presented token exists, is active, and has not expired.
    ///
    /// Every failure cause, including store errors and malformed two-factor
    /// credentials, collapses to `false`.
    pub fn validate_token(&self, presented: &str) -> bool {
        self.resolve(presented).is_some()
    }

    /// Read-only projection of the token, absent if the token is invalid.
    pub fn get_token_info(&self, presented: &str) -> Option<TokenInfo> {
        self.resolve(presented).map(|record| record.info())
    }

    /// Whether the request origin is acceptable for this token.
    ///
    /// An empty origin list means the token is not origin-restricted.
    /// Otherwise the client IP or the origin hostname must match one of the
    /// listed patterns.
    pub fn check_origin(&self, presented: &str, client_ip: &str, origin_host: &str) -> bool {
        let Some(record) = self.resolve(presented) else {
            return false;
        };
        if record.origins.is_empty() {
            return true;
        }
        record.origins.iter().any(|origin| {
            pattern::matches(client_ip, origin, PatternKind::Network)
                || pattern::matches(origin_host, origin, PatternKind::Network)
        })
    }

    /// The central authorization decision: may this token perform `action`
    /// on `domain`, optionally narrowed to one record name and type?
    pub fn check_permission(
        &self,
        presented: &str,
        action: Operation,
        domain: &str,
        record_name: Option<&str>,
        record_type: Option<&str>,
    ) -> bool {
        self.decide_permission(presented, action, domain, record_name, record_type)
            .allowed
    }

    /// Same walk as `check_permission`, keeping the matched rule index and
    /// an audit-only reason. Produced fresh on every call.
    pub fn decide_permission(
        &self,
        presented: &str,
        action: Operation,
        domain: &str,
        record_name: Option<&str>,
        record_type: Option<&str>,
    ) -> AuthorizationDecision {
        let Some(record) = self.resolve(presented) else {
            return AuthorizationDecision::deny("authentication failed");
        };
        record.scope.decide(action, domain, record_name, record_type)
    }

    /// The subset of `records` the token may read. An invalid token sees
    /// nothing, never a partial listing.
    pub fn filter_dns_records(
        &self,
        presented: &str,
        domain: &str,
        records: &[DnsRecord],
    ) -> Vec<DnsRecord> {
        let Some(record) = self.resolve(presented) else {
            return Vec::new();
        };
        records
            .iter()
            .filter(|r| {
                record.scope.authorize(
                    Operation::Read,
                    domain,
                    Some(r.hostname.as_str()),
                    Some(r.record_type.as_str()),
                )
            })
            .cloned()
            .collect()
    }

    /// Authorize a batch of record mutations before anything is sent
    /// upstream. The first unauthorized record aborts the whole batch with a
    /// descriptive error; callers must not apply any partial update.
    pub fn validate_dns_records_update(
        &self,
        presented: &str,
        domain: &str,
        updates: &[RecordUpdate],
    ) -> (bool, Option<String>) {
        let Some(record) = self.resolve(presented) else {
            return (false, Some("authentication failed".to_string()));
        };
        for update in updates {
            let action = update.operation();
            let allowed = record.scope.authorize(
                action,
                domain,
                Some(update.hostname.as_str()),
                Some(update.record_type.as_str()),
            );
            if !allowed {
                return (
                    false,
                    Some(format!(
                        "{action} not permitted for record '{}' ({}) on {domain}",
                        update.hostname, update.record_type
                    )),
                );
            }
        }
        (true, None)
    }

    /// Resolve a presented credential to a usable token record.
    ///
    /// Expired and disabled tokens come back as `None`, indistinguishable
    /// from unknown tokens. Store failures are logged and fail closed.
    fn resolve(&self, presented: &str) -> Option<TokenRecord> {
        let looked_up = if self.config.two_factor {
            self.resolve_two_factor(presented)
        } else {
            match self.store.find_by_secret(presented) {
                Ok(record) => record,
                Err(e) => {
                    log::error!("token lookup failed: {e}");
                    None
                }
            }
        };
        looked_up.filter(TokenRecord::is_valid)
    }

    /// Two-factor resolution: split `client_id:secret_key` on the single
    /// fixed separator, look up the public half, verify the secret against
    /// its stored hash. Zero or multiple colons are malformed.
    fn resolve_two_factor(&self, presented: &str) -> Option<TokenRecord> {
        let mut parts = presented.split(':');
        let (client_id, secret) = match (parts.next(), parts.next(), parts.next()) {
            (Some(client_id), Some(secret), None) => (client_id, secret),
            _ => return None,
        };
        match self.store.find_by_client_id(client_id) {
            Ok(Some(record)) if record.verify_secret(secret) => Some(record),
            Ok(_) => None,
            Err(e) => {
                log::error!("token lookup failed: {e}");
                None
            }
        }
    }
}

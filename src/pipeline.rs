//! The per-request filtering pipeline.
//!
//! Order per inbound request: authenticate, authorize the origin, validate
//! the request structurally, consult the engine, and only then talk to the
//! upstream DNS client. Every outcome is audited best-effort, and a denial
//! is audited before it is returned. Denial responses are generic; they
//! never reveal which rule was closest to matching.

use crate::audit::{AuditEvent, AuditSink};
use crate::dns::{self, DnsClient, DnsRecord, RecordUpdate, UpdateOutcome};
use crate::engine::AccessControlEngine;
use crate::notify::{SecurityEventKind, SecurityEventNotifier};
use crate::permissions::Operation;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

/// Caller-visible rejection categories. Within a category every denial
/// carries the same message, so callers cannot probe for which permission
/// rules exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("origin not permitted")]
    OriginDenied,

    #[error("permission denied")]
    PermissionDenied,

    #[error("malformed request: {0}")]
    MalformedInput(String),

    #[error("upstream DNS API error: {0}")]
    Upstream(String),
}

/// Where a request came from.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub client_ip: String,
    pub origin_host: String,
}

impl RequestContext {
    pub fn new(client_ip: impl Into<String>, origin_host: impl Into<String>) -> Self {
        Self {
            client_ip: client_ip.into(),
            origin_host: origin_host.into(),
        }
    }
}

pub struct RequestFilterPipeline {
    engine: AccessControlEngine,
    dns: Arc<dyn DnsClient>,
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn SecurityEventNotifier>,
}

impl RequestFilterPipeline {
    pub fn new(
        engine: AccessControlEngine,
        dns: Arc<dyn DnsClient>,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn SecurityEventNotifier>,
    ) -> Self {
        Self {
            engine,
            dns,
            audit,
            notifier,
        }
    }

    pub fn engine(&self) -> &AccessControlEngine {
        &self.engine
    }

    /// List the records of a zone, filtered down to what the token may read.
    pub async fn list_records(
        &self,
        presented: &str,
        ctx: &RequestContext,
        domain: &str,
    ) -> Result<Vec<DnsRecord>, PipelineError> {
        self.gate(presented, ctx, "read", domain).await?;

        if !self
            .engine
            .check_permission(presented, Operation::Read, domain, None, None)
        {
            return Err(self.deny_permission(presented, ctx, "read", domain, None).await);
        }

        let records = match self.dns.list_records(domain).await {
            Ok(records) => records,
            Err(e) => return Err(self.upstream_failure(presented, ctx, "read", domain, e).await),
        };
        let visible = self.engine.filter_dns_records(presented, domain, &records);

        let token_id = self.engine.get_token_info(presented).map(|info| info.id);
        self.audit
            .record(
                AuditEvent::new(token_id, &ctx.client_ip, "read", domain, true)
                    .with_response(&json!({ "records": visible.len() })),
            )
            .await;
        Ok(visible)
    }

    /// Apply a batch of record mutations. Authorization is all-or-nothing
    /// and happens strictly before anything is sent upstream.
    pub async fn update_records(
        &self,
        presented: &str,
        ctx: &RequestContext,
        domain: &str,
        updates: Vec<RecordUpdate>,
    ) -> Result<UpdateOutcome, PipelineError> {
        self.gate(presented, ctx, "update", domain).await?;

        for update in &updates {
            if !dns::is_valid_record_name(&update.hostname) {
                return Err(self
                    .malformed(presented, ctx, "update", domain, &update.hostname)
                    .await);
            }
        }

        let (ok, error) = self
            .engine
            .validate_dns_records_update(presented, domain, &updates);
        if !ok {
            let detail = error.unwrap_or_else(|| "permission denied".to_string());
            return Err(self
                .deny_permission(presented, ctx, "update", domain, Some(detail.as_str()))
                .await);
        }

        let outcome = match self.dns.apply_updates(domain, &updates).await {
            Ok(outcome) => outcome,
            Err(e) => {
                return Err(self.upstream_failure(presented, ctx, "update", domain, e).await)
            }
        };

        let token_id = self.engine.get_token_info(presented).map(|info| info.id);
        let request_payload = serde_json::to_value(&updates).unwrap_or(serde_json::Value::Null);
        self.audit
            .record(
                AuditEvent::new(token_id, &ctx.client_ip, "update", domain, true)
                    .with_request(&request_payload)
                    .with_response(&json!({ "applied": outcome.applied })),
            )
            .await;
        Ok(outcome)
    }

    /// Pure decision endpoint: would this token be allowed to perform the
    /// action? Nothing is forwarded upstream.
    pub async fn check_access(
        &self,
        presented: &str,
        ctx: &RequestContext,
        action: Operation,
        domain: &str,
        record_name: Option<&str>,
        record_type: Option<&str>,
    ) -> Result<(), PipelineError> {
        self.gate(presented, ctx, action.as_str(), domain).await?;

        if let Some(name) = record_name {
            if !dns::is_valid_record_name(name) {
                return Err(self
                    .malformed(presented, ctx, action.as_str(), domain, name)
                    .await);
            }
        }

        let decision =
            self.engine
                .decide_permission(presented, action, domain, record_name, record_type);
        if !decision.allowed {
            return Err(self
                .deny_permission(
                    presented,
                    ctx,
                    action.as_str(),
                    domain,
                    Some(decision.reason.as_str()),
                )
                .await);
        }

        let token_id = self.engine.get_token_info(presented).map(|info| info.id);
        self.audit
            .record(AuditEvent::new(
                token_id,
                &ctx.client_ip,
                action.as_str(),
                domain,
                true,
            ))
            .await;
        Ok(())
    }

    /// Authentication, origin authorization, and structural domain
    /// validation, in that order.
    async fn gate(
        &self,
        presented: &str,
        ctx: &RequestContext,
        action: &str,
        domain: &str,
    ) -> Result<(), PipelineError> {
        if !self.engine.validate_token(presented) {
            self.notifier
                .notify(
                    SecurityEventKind::AuthenticationFailure,
                    "invalid or unknown token",
                    &ctx.client_ip,
                )
                .await;
            self.audit
                .record(
                    AuditEvent::new(None, &ctx.client_ip, action, domain, false)
                        .with_error("authentication failed"),
                )
                .await;
            return Err(PipelineError::AuthenticationFailed);
        }

        if !self
            .engine
            .check_origin(presented, &ctx.client_ip, &ctx.origin_host)
        {
            let token_id = self.engine.get_token_info(presented).map(|info| info.id);
            self.notifier
                .notify(
                    SecurityEventKind::OriginViolation,
                    &format!("origin {} not permitted for token", ctx.client_ip),
                    &ctx.client_ip,
                )
                .await;
            self.audit
                .record(
                    AuditEvent::new(token_id, &ctx.client_ip, action, domain, false)
                        .with_error("origin not permitted"),
                )
                .await;
            return Err(PipelineError::OriginDenied);
        }

        if !dns::is_valid_domain(domain) {
            return Err(self.malformed(presented, ctx, action, domain, domain).await);
        }
        Ok(())
    }

    /// Audit and alert a permission denial. The audit entry keeps the
    /// detailed reason; the caller gets the generic category only.
    async fn deny_permission(
        &self,
        presented: &str,
        ctx: &RequestContext,
        action: &str,
        domain: &str,
        detail: Option<&str>,
    ) -> PipelineError {
        let info = self.engine.get_token_info(presented);
        let notify_on_denial = info.as_ref().map(|i| i.notify_on_denial).unwrap_or(false);
        let token_id = info.map(|i| i.id);

        if notify_on_denial {
            self.notifier
                .notify(
                    SecurityEventKind::PermissionDenied,
                    &format!("{action} on {domain} denied"),
                    &ctx.client_ip,
                )
                .await;
        }
        self.audit
            .record(
                AuditEvent::new(token_id, &ctx.client_ip, action, domain, false)
                    .with_error(detail.unwrap_or("permission denied")),
            )
            .await;
        PipelineError::PermissionDenied
    }

    async fn malformed(
        &self,
        presented: &str,
        ctx: &RequestContext,
        action: &str,
        domain: &str,
        input: &str,
    ) -> PipelineError {
        let token_id = self.engine.get_token_info(presented).map(|info| info.id);
        self.audit
            .record(
                AuditEvent::new(token_id, &ctx.client_ip, action, domain, false)
                    .with_error(format!("malformed input: {input}")),
            )
            .await;
        PipelineError::MalformedInput(format!("invalid name: {input}"))
    }

    async fn upstream_failure(
        &self,
        presented: &str,
        ctx: &RequestContext,
        action: &str,
        domain: &str,
        error: crate::error::ZonegateError,
    ) -> PipelineError {
        let token_id = self.engine.get_token_info(presented).map(|info| info.id);
        self.audit
            .record(
                AuditEvent::new(token_id, &ctx.client_ip, action, domain, false)
                    .with_error(format!("upstream failure: {error}")),
            )
            .await;
        PipelineError::Upstream(error.to_string())
    }
}

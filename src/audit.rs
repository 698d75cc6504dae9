//! Audit logging for authorization decisions.
//!
//! Every decision, allowed or denied, is offered to a sink. Sinks are
//! best-effort: a failing or slow sink never changes a decision that was
//! already made.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

/// One audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for this entry.
    pub id: String,
    /// Unix timestamp when the decision was made.
    pub timestamp: i64,
    /// Token record id, if the request authenticated far enough to have one.
    pub token_id: Option<String>,
    /// Client IP the request came from.
    pub ip: String,
    /// Requested action (read/create/update/delete).
    pub action: String,
    /// Domain the request targeted.
    pub domain: String,
    pub success: bool,
    pub error: Option<String>,
    /// Request payload with sensitive fields masked.
    pub masked_request: Option<Value>,
    /// Response summary with sensitive fields masked.
    pub masked_response: Option<Value>,
}

impl AuditEvent {
    pub fn new(
        token_id: Option<String>,
        ip: impl Into<String>,
        action: impl Into<String>,
        domain: impl Into<String>,
        success: bool,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            token_id,
            ip: ip.into(),
            action: action.into(),
            domain: domain.into(),
            success,
            error: None,
            masked_request: None,
            masked_response: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attach a request payload. Masking is applied here so no sink ever
    /// sees the raw value.
    pub fn with_request(mut self, request: &Value) -> Self {
        self.masked_request = Some(mask_sensitive(request));
        self
    }

    /// Attach a response summary, masked the same way.
    pub fn with_response(mut self, response: &Value) -> Self {
        self.masked_response = Some(mask_sensitive(response));
        self
    }
}

const SENSITIVE_KEYS: &[&str] = &["password", "secret", "token", "session", "key"];

/// Replace the values of sensitive keys with `"***"`, recursively through
/// objects and arrays. Key matching is case-insensitive and substring-based,
/// so `session_id`, `api_key` and `apiToken` are masked too.
pub fn mask_sensitive(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| {
                    let lower = key.to_ascii_lowercase();
                    if SENSITIVE_KEYS.iter().any(|s| lower.contains(s)) {
                        (key.clone(), Value::String("***".to_string()))
                    } else {
                        (key.clone(), mask_sensitive(val))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(mask_sensitive).collect()),
        other => other.clone(),
    }
}

/// Destination for audit entries, implemented by the surrounding service.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

/// Bounded in-memory audit log, oldest entries dropped first.
pub struct MemoryAuditSink {
    entries: RwLock<Vec<AuditEvent>>,
    max_entries: usize,
}

impl MemoryAuditSink {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            max_entries,
        }
    }

    /// Most recent entries, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        let entries = self.entries.read().await;
        entries.iter().rev().take(limit).cloned().collect()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: AuditEvent) {
        let mut entries = self.entries.write().await;
        entries.push(event);
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(0..excess);
        }
    }
}

/// Sink that writes audit lines through the standard logger.
pub struct LogAuditSink;

#[async_trait]
impl AuditSink for LogAuditSink {
    async fn record(&self, event: AuditEvent) {
        if event.success {
            log::info!(
                "SECURITY_AUDIT: allowed - token={:?}, ip={}, action={}, domain={}",
                event.token_id,
                event.ip,
                event.action,
                event.domain
            );
        } else {
            log::warn!(
                "SECURITY_AUDIT: denied - token={:?}, ip={}, action={}, domain={}, error={:?}",
                event.token_id,
                event.ip,
                event.action,
                event.domain,
                event.error
            );
        }
    }
}

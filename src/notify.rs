//! Security event notification.
//!
//! Fire-and-forget alerts for the three security-relevant denial
//! categories. Delivery (email, webhook) is implemented by the surrounding
//! service; a notifier failure never affects the decision.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a security event worth alerting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityEventKind {
    AuthenticationFailure,
    OriginViolation,
    PermissionDenied,
}

impl fmt::Display for SecurityEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecurityEventKind::AuthenticationFailure => "AUTHENTICATION_FAILURE",
            SecurityEventKind::OriginViolation => "ORIGIN_VIOLATION",
            SecurityEventKind::PermissionDenied => "PERMISSION_DENIED",
        };
        f.write_str(name)
    }
}

/// Best-effort security alerting, implemented by the surrounding service.
#[async_trait]
pub trait SecurityEventNotifier: Send + Sync {
    async fn notify(&self, kind: SecurityEventKind, details: &str, ip: &str);
}

/// Notifier that writes events through the standard logger.
pub struct LogNotifier;

#[async_trait]
impl SecurityEventNotifier for LogNotifier {
    async fn notify(&self, kind: SecurityEventKind, details: &str, ip: &str) {
        log::warn!("SECURITY_EVENT: {kind} from {ip}: {details}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names() {
        assert_eq!(
            SecurityEventKind::AuthenticationFailure.to_string(),
            "AUTHENTICATION_FAILURE"
        );
        assert_eq!(
            SecurityEventKind::OriginViolation.to_string(),
            "ORIGIN_VIOLATION"
        );
        assert_eq!(
            SecurityEventKind::PermissionDenied.to_string(),
            "PERMISSION_DENIED"
        );
    }

    #[test]
    fn test_event_kind_serde() {
        let json = serde_json::to_string(&SecurityEventKind::OriginViolation).unwrap();
        assert_eq!(json, "\"ORIGIN_VIOLATION\"");
    }
}

//! zonegate is the access-control core of a filtering reverse-proxy that
//! sits in front of a DNS provider's control-panel API. It accepts
//! narrowly-scoped API tokens, enforces per-token permission policies
//! (domain, record, operation, and origin scoping), and authorizes
//! operations before they are forwarded upstream, audit-logging every
//! decision.
//!
//! The crate is fail-closed throughout: malformed input, unsafe patterns,
//! store failures, and expired or disabled tokens all resolve to deny.
//! The HTTP layer, admin UI, persistence, and the concrete upstream DNS
//! client live outside this crate and plug in through the `TokenStore`,
//! `DnsClient`, `AuditSink`, and `SecurityEventNotifier` traits.

pub mod audit;
pub mod config;
pub mod dns;
pub mod engine;
pub mod error;
pub mod notify;
pub mod pattern;
pub mod permissions;
pub mod pipeline;
pub mod store;

pub use audit::{AuditEvent, AuditSink, LogAuditSink, MemoryAuditSink};
pub use config::EngineConfig;
pub use dns::{DnsClient, DnsRecord, RecordUpdate, UpdateOutcome};
pub use engine::AccessControlEngine;
pub use error::{ZonegateError, ZonegateResult};
pub use notify::{LogNotifier, SecurityEventKind, SecurityEventNotifier};
pub use pattern::{PatternKind, RealmType};
pub use permissions::{
    AuthorizationDecision, Operation, PermissionRule, TokenInfo, TokenRecord, TokenScope,
};
pub use pipeline::{PipelineError, RequestContext, RequestFilterPipeline};
pub use store::{MemoryTokenStore, StaticTokenStore, TokenStore};

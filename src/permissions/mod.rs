//! Permission model: rules, token scopes, and token records.

pub mod rule;
pub mod scope;
pub mod token;

pub use rule::PermissionRule;
pub use scope::{AuthorizationDecision, TokenScope};
pub use token::{hash_secret, Operation, TokenInfo, TokenRecord};

use thiserror::Error;

/// Errors raised while interpreting permission data.
#[derive(Error, Debug)]
pub enum PermissionError {
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
}

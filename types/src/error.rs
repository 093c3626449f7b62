//! Parse errors for the shared types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid {kind}: {reason}")]
    InvalidHash { kind: &'static str, reason: String },

    #[error("unknown credential type: {0}")]
    UnknownCredentialType(String),

    #[error("unknown visibility: {0}")]
    UnknownVisibility(String),

    #[error("unknown network profile: {0}")]
    UnknownNetwork(String),
}

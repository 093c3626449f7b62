//! Client-facing errors.
//!
//! Every failure leaving the client is a [`ForgeError`] whose [`ErrorKind`]
//! comes from a closed taxonomy. The human-readable message and the
//! underlying cause travel with it so the caller can both branch on the kind
//! and log the original failure.

use forge_types::TransactionOutcome;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ConnectionFailed,
    TransactionFailed,
    InsufficientBalance,
    CredentialAlreadyExists,
    MetadataTooLarge,
    TooManyCredentials,
    CredentialNotFound,
    NotCredentialOwner,
    NetworkError,
    ValidationError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionFailed => "CONNECTION_FAILED",
            Self::TransactionFailed => "TRANSACTION_FAILED",
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::CredentialAlreadyExists => "CREDENTIAL_ALREADY_EXISTS",
            Self::MetadataTooLarge => "METADATA_TOO_LARGE",
            Self::TooManyCredentials => "TOO_MANY_CREDENTIALS",
            Self::CredentialNotFound => "CREDENTIAL_NOT_FOUND",
            Self::NotCredentialOwner => "NOT_CREDENTIAL_OWNER",
            Self::NetworkError => "NETWORK_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
        }
    }

    /// Failures worth retrying on an idempotent path.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkError | Self::ConnectionFailed)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified client failure.
#[derive(Debug)]
pub struct ForgeError {
    kind: ErrorKind,
    message: String,
    cancelled: bool,
    outcome: Option<TransactionOutcome>,
    cause: Option<BoxError>,
}

impl ForgeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cancelled: false,
            outcome: None,
            cause: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn transaction_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransactionFailed, message)
    }

    /// The user declined to sign. Kind stays `TRANSACTION_FAILED`.
    pub fn user_cancelled(message: impl Into<String>) -> Self {
        Self {
            cancelled: true,
            ..Self::transaction_failed(message)
        }
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    /// Attach the failed outcome of a transaction the chain did see.
    pub fn with_outcome(mut self, outcome: TransactionOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_user_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }

    pub fn outcome(&self) -> Option<&TransactionOutcome> {
        self.outcome.as_ref()
    }

    /// Serializable `{ kind, message, cause? }` for UI callers.
    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            kind: self.kind,
            message: self.message.clone(),
            cause: self.cause.as_ref().map(|c| c.to_string()),
            cancelled: self.cancelled,
        }
    }
}

impl fmt::Display for ForgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for ForgeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn kinds_serialize_screaming() {
        let json = serde_json::to_string(&ErrorKind::NotCredentialOwner).unwrap();
        assert_eq!(json, "\"NOT_CREDENTIAL_OWNER\"");
        assert_eq!(ErrorKind::MetadataTooLarge.to_string(), "METADATA_TOO_LARGE");
    }

    #[test]
    fn cause_is_exposed_as_source() {
        let err = ForgeError::new(ErrorKind::NetworkError, "read failed")
            .with_cause(io::Error::new(io::ErrorKind::TimedOut, "socket timeout"));
        assert_eq!(err.source().unwrap().to_string(), "socket timeout");
        assert_eq!(err.to_string(), "NETWORK_ERROR: read failed");
    }

    #[test]
    fn payload_shape() {
        let err = ForgeError::validation("missing required field: name");
        let value = serde_json::to_value(err.payload()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"kind": "VALIDATION_ERROR", "message": "missing required field: name"})
        );
    }

    #[test]
    fn cancellation_is_a_failed_transaction() {
        let err = ForgeError::user_cancelled("Cancelled by user");
        assert_eq!(err.kind(), ErrorKind::TransactionFailed);
        assert!(err.is_user_cancelled());
        assert!(err.payload().cancelled);
        assert!(!err.is_transient());
    }

    #[test]
    fn transient_kinds() {
        assert!(ErrorKind::NetworkError.is_transient());
        assert!(ErrorKind::ConnectionFailed.is_transient());
        assert!(!ErrorKind::CredentialNotFound.is_transient());
    }
}

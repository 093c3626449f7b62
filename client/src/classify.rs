//! Error classification.
//!
//! Precedence, first match wins:
//!
//! 1. a decoded module error name (the credentials pallet's errors, plus
//!    `InsufficientBalance` from the balances pallet)
//! 2. message heuristics, case-insensitive: `balance`, then
//!    `cancel`/`rejected`, then `timeout`/`timed out`/`network`/`connection`
//! 3. `TRANSACTION_FAILED` with the original message preserved
//!
//! Transport failures are classified by variant first. Only submission and
//! signer failures carry node or wallet text worth the message rules; every
//! other transport failure is a `NETWORK_ERROR`, so reads retry.

use forge_metadata::CodecError;
use forge_protocol::{DispatchError, PalletError, TransportError};

use crate::{ErrorKind, ForgeError};

/// Map a module error name onto the taxonomy.
pub fn kind_for_module_error(name: &str) -> Option<ErrorKind> {
    if name == "InsufficientBalance" {
        return Some(ErrorKind::InsufficientBalance);
    }
    PalletError::from_name(name).map(|error| match error {
        PalletError::CredentialAlreadyExists => ErrorKind::CredentialAlreadyExists,
        PalletError::MetadataTooLarge => ErrorKind::MetadataTooLarge,
        PalletError::TooManyCredentials => ErrorKind::TooManyCredentials,
        PalletError::CredentialNotFound => ErrorKind::CredentialNotFound,
        PalletError::NotCredentialOwner => ErrorKind::NotCredentialOwner,
    })
}

/// Classify a failure known only by its message.
pub fn classify_message(message: &str) -> ForgeError {
    let lower = message.to_lowercase();
    if lower.contains("balance") {
        ForgeError::new(ErrorKind::InsufficientBalance, message)
    } else if lower.contains("cancel") || lower.contains("rejected") {
        ForgeError::user_cancelled(message)
    } else if ["timeout", "timed out", "network", "connection"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        ForgeError::new(ErrorKind::NetworkError, message)
    } else {
        ForgeError::transaction_failed(message)
    }
}

/// Classify a dispatch failure reported in a finalized block.
pub fn classify_dispatch(error: &DispatchError) -> ForgeError {
    let classified = match error.module_error().and_then(kind_for_module_error) {
        Some(kind) => ForgeError::new(kind, error.to_string()),
        None => classify_message(&error.to_string()),
    };
    classified.with_cause(error.clone())
}

impl From<DispatchError> for ForgeError {
    fn from(error: DispatchError) -> Self {
        classify_dispatch(&error)
    }
}

impl From<TransportError> for ForgeError {
    fn from(error: TransportError) -> Self {
        let classified = match &error {
            TransportError::InvalidAddress(_) => ForgeError::validation(error.to_string()),
            TransportError::Submit(_) | TransportError::Signer(_) => {
                classify_message(&error.to_string())
            }
            TransportError::Connect(_)
            | TransportError::Timeout(_)
            | TransportError::Rpc { .. }
            | TransportError::Closed
            | TransportError::Decode(_) => {
                ForgeError::new(ErrorKind::NetworkError, error.to_string())
            }
        };
        classified.with_cause(error)
    }
}

impl From<CodecError> for ForgeError {
    fn from(error: CodecError) -> Self {
        let kind = match &error {
            CodecError::MetadataTooLarge { .. } => ErrorKind::MetadataTooLarge,
            _ => ErrorKind::ValidationError,
        };
        ForgeError::new(kind, error.to_string()).with_cause(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_protocol::SignerError;

    #[test]
    fn module_errors_map_directly() {
        let err = classify_dispatch(&DispatchError::credentials(
            PalletError::CredentialAlreadyExists,
        ));
        assert_eq!(err.kind(), ErrorKind::CredentialAlreadyExists);
        assert_eq!(err.message(), "FreelanceCredentials.CredentialAlreadyExists");
        let source = std::error::Error::source(&err).expect("dispatch error kept as cause");
        assert_eq!(source.to_string(), "FreelanceCredentials.CredentialAlreadyExists");

        for (error, kind) in [
            (PalletError::MetadataTooLarge, ErrorKind::MetadataTooLarge),
            (PalletError::TooManyCredentials, ErrorKind::TooManyCredentials),
            (PalletError::CredentialNotFound, ErrorKind::CredentialNotFound),
            (PalletError::NotCredentialOwner, ErrorKind::NotCredentialOwner),
        ] {
            assert_eq!(classify_dispatch(&DispatchError::credentials(error)).kind(), kind);
        }
    }

    #[test]
    fn balances_module_error() {
        let err = classify_dispatch(&DispatchError::Module {
            pallet: "Balances".into(),
            error: "InsufficientBalance".into(),
        });
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    }

    #[test]
    fn unknown_module_error_is_generic() {
        // Unknown module errors fall through to the message rules.
        let err = classify_dispatch(&DispatchError::Module {
            pallet: "System".into(),
            error: "CallFiltered".into(),
        });
        assert_eq!(err.kind(), ErrorKind::TransactionFailed);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn message_heuristics() {
        assert_eq!(
            classify_message("Inability to pay some fees (e.g. account balance too low)").kind(),
            ErrorKind::InsufficientBalance
        );
        let cancelled = classify_message("Cancelled by user");
        assert_eq!(cancelled.kind(), ErrorKind::TransactionFailed);
        assert!(cancelled.is_user_cancelled());
        assert!(classify_message("Request rejected").is_user_cancelled());
        assert_eq!(classify_message("Connection reset").kind(), ErrorKind::NetworkError);
        assert_eq!(classify_message("request TIMEOUT").kind(), ErrorKind::NetworkError);
        assert_eq!(classify_message("network unreachable").kind(), ErrorKind::NetworkError);
    }

    #[test]
    fn balance_takes_precedence_over_network() {
        assert_eq!(
            classify_message("network says balance too low").kind(),
            ErrorKind::InsufficientBalance
        );
    }

    #[test]
    fn unknown_message_keeps_text() {
        let err = classify_message("1010: Invalid Transaction: Stale");
        assert_eq!(err.kind(), ErrorKind::TransactionFailed);
        assert_eq!(err.message(), "1010: Invalid Transaction: Stale");
        assert!(!err.is_user_cancelled());
    }

    #[test]
    fn signer_rejection_is_cancellation() {
        let err = ForgeError::from(TransportError::Signer(SignerError::Rejected(
            "Cancelled by user".into(),
        )));
        assert!(err.is_user_cancelled());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn transport_failures() {
        assert_eq!(ForgeError::from(TransportError::Closed).kind(), ErrorKind::NetworkError);
        assert_eq!(
            ForgeError::from(TransportError::Timeout("ready".into())).kind(),
            ErrorKind::NetworkError
        );
        assert_eq!(
            ForgeError::from(TransportError::InvalidAddress("x".into())).kind(),
            ErrorKind::ValidationError
        );
    }

    #[test]
    fn node_and_decode_failures_are_transient_whatever_their_text() {
        for error in [
            TransportError::Rpc {
                code: -32000,
                message: "Client error: state unavailable".into(),
            },
            TransportError::Decode("storage value is not hex".into()),
            TransportError::Connect("refused".into()),
        ] {
            let err = ForgeError::from(error);
            assert_eq!(err.kind(), ErrorKind::NetworkError);
            assert!(err.is_transient());
        }
    }

    #[test]
    fn submission_text_still_classified_by_message() {
        let err = ForgeError::from(TransportError::Submit(
            "Inability to pay some fees (e.g. account balance too low) (code 1010)".into(),
        ));
        assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
        assert_eq!(
            ForgeError::from(TransportError::Submit("Transaction is outdated".into())).kind(),
            ErrorKind::TransactionFailed
        );
    }

    #[test]
    fn codec_errors() {
        let too_large = ForgeError::from(CodecError::MetadataTooLarge {
            size: 4100,
            limit: 3072,
        });
        assert_eq!(too_large.kind(), ErrorKind::MetadataTooLarge);
        assert!(too_large.message().contains("4100"));
        assert_eq!(
            ForgeError::from(CodecError::Validation("x".into())).kind(),
            ErrorKind::ValidationError
        );
    }
}

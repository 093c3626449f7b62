//! Fundamental types for the FreelanceForge credential client.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! hashes and identifiers, accounts, the credential data model, transaction
//! outcomes and network profiles.

pub mod address;
pub mod credential;
pub mod error;
pub mod hash;
pub mod network;
pub mod outcome;

pub use address::AccountId;
pub use credential::{
    CredentialDraft, CredentialMetadata, CredentialRecord, CredentialType, CredentialUpdate,
    Visibility,
};
pub use error::TypesError;
pub use hash::{BlockHash, CredentialId, TxHash};
pub use network::NetworkProfile;
pub use outcome::TransactionOutcome;

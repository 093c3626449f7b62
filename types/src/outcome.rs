//! Result of one submitted credential operation.

use serde::{Deserialize, Serialize};

use crate::{BlockHash, CredentialId, TxHash};

/// Settled result of a mint, update or delete.
///
/// Produced exactly once per submission, and never ambiguous: a successful
/// outcome always carries the finalized block hash and no error, a failed one
/// always carries an error and no block hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutcome {
    hash: TxHash,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_hash: Option<BlockHash>,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credential_id: Option<CredentialId>,
}

impl TransactionOutcome {
    /// A transaction that reached finality without a dispatch error.
    pub fn finalized(hash: TxHash, block_hash: BlockHash) -> Self {
        Self {
            hash,
            block_hash: Some(block_hash),
            success: true,
            error: None,
            credential_id: None,
        }
    }

    /// A transaction the chain saw but did not apply.
    pub fn failed(hash: TxHash, error: impl Into<String>) -> Self {
        Self {
            hash,
            block_hash: None,
            success: false,
            error: Some(error.into()),
            credential_id: None,
        }
    }

    /// Attach the credential the operation minted or touched.
    pub fn with_credential_id(mut self, id: CredentialId) -> Self {
        self.credential_id = Some(id);
        self
    }

    pub fn hash(&self) -> TxHash {
        self.hash
    }

    pub fn block_hash(&self) -> Option<BlockHash> {
        self.block_hash
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn credential_id(&self) -> Option<CredentialId> {
        self.credential_id
    }
}

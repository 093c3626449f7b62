//! Transaction lifecycle as reported by a transport.

use forge_types::{AccountId, BlockHash, CredentialId, TxHash};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::pallet::{PalletError, PALLET_NAME};

/// Why a dispatched extrinsic failed.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// A named module error, e.g. `FreelanceCredentials.CredentialNotFound`.
    #[error("{pallet}.{error}")]
    Module { pallet: String, error: String },

    #[error("{0}")]
    Other(String),
}

impl DispatchError {
    pub fn credentials(error: PalletError) -> Self {
        Self::Module {
            pallet: PALLET_NAME.to_string(),
            error: error.name().to_string(),
        }
    }

    /// The module error name, if this is a module error.
    pub fn module_error(&self) -> Option<&str> {
        match self {
            Self::Module { error, .. } => Some(error),
            Self::Other(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialEvent {
    Minted { id: CredentialId, owner: AccountId },
    Updated { id: CredentialId, owner: AccountId },
    Deleted { id: CredentialId, owner: AccountId },
}

impl CredentialEvent {
    pub fn id(&self) -> CredentialId {
        match self {
            Self::Minted { id, .. } | Self::Updated { id, .. } | Self::Deleted { id, .. } => *id,
        }
    }
}

/// Events emitted by the extrinsic in its finalized block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainEvent {
    ExtrinsicSuccess,
    ExtrinsicFailed(DispatchError),
    Credential(CredentialEvent),
}

/// One step in a submitted extrinsic's lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxStatus {
    /// Accepted into the pool or broadcast; nothing to act on yet.
    Pending,
    InBlock(BlockHash),
    Finalized {
        block_hash: BlockHash,
        events: Vec<ChainEvent>,
    },
    /// The pool dropped or invalidated the extrinsic, or the subscription died.
    Error(String),
}

/// A submitted extrinsic and the stream of its status updates.
#[derive(Debug)]
pub struct Submission {
    pub tx_hash: TxHash,
    pub statuses: mpsc::UnboundedReceiver<TxStatus>,
}

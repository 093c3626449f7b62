//! Turning a status stream into exactly one outcome.

use forge_protocol::{ChainEvent, CredentialEvent, Submission, TxStatus};
use forge_types::{TransactionOutcome, TxHash};
use tracing::{debug, info};

use crate::classify::classify_dispatch;
use crate::ForgeError;

/// A transaction that reached finality without a dispatch error.
#[derive(Clone, Debug, PartialEq)]
pub struct Settled {
    pub outcome: TransactionOutcome,
    pub events: Vec<ChainEvent>,
}

impl Settled {
    /// The credential event the pallet emitted, if any.
    pub fn credential_event(&self) -> Option<&CredentialEvent> {
        self.events.iter().find_map(|event| match event {
            ChainEvent::Credential(ev) => Some(ev),
            _ => None,
        })
    }
}

/// Folds status notifications; the first terminal one settles it and every
/// notification after that is ignored.
#[derive(Debug)]
pub struct StatusTracker {
    tx_hash: TxHash,
    settled: bool,
}

impl StatusTracker {
    pub fn new(tx_hash: TxHash) -> Self {
        Self {
            tx_hash,
            settled: false,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// `Some` exactly once, for the first terminal status.
    pub fn observe(&mut self, status: TxStatus) -> Option<Result<Settled, ForgeError>> {
        if self.settled {
            debug!(tx_hash = %self.tx_hash, ?status, "ignoring status after settlement");
            return None;
        }
        let result = match status {
            TxStatus::Pending => return None,
            TxStatus::InBlock(block) => {
                debug!(tx_hash = %self.tx_hash, block = %block, "included in block");
                return None;
            }
            TxStatus::Finalized { block_hash, events } => self.finalized(block_hash, events),
            TxStatus::Error(reason) => Err(ForgeError::transaction_failed(format!(
                "transaction {}: {reason}",
                self.tx_hash
            ))
            .with_outcome(TransactionOutcome::failed(self.tx_hash, reason))),
        };
        self.settled = true;
        Some(result)
    }

    fn finalized(
        &self,
        block_hash: forge_types::BlockHash,
        events: Vec<ChainEvent>,
    ) -> Result<Settled, ForgeError> {
        let failure = events.iter().find_map(|event| match event {
            ChainEvent::ExtrinsicFailed(err) => Some(err),
            _ => None,
        });
        if let Some(dispatch) = failure {
            let err = classify_dispatch(dispatch);
            let outcome = TransactionOutcome::failed(self.tx_hash, err.message());
            return Err(err.with_outcome(outcome));
        }
        info!(tx_hash = %self.tx_hash, block = %block_hash, "finalized");
        Ok(Settled {
            outcome: TransactionOutcome::finalized(self.tx_hash, block_hash),
            events,
        })
    }
}

/// Wait for the submission's first terminal status.
///
/// There is no timeout: a caller that needs one wraps this future. Dropping
/// it drops the receiver, so nothing the transport sends later is observed.
pub async fn await_outcome(mut submission: Submission) -> Result<Settled, ForgeError> {
    let mut tracker = StatusTracker::new(submission.tx_hash);
    while let Some(status) = submission.statuses.recv().await {
        if let Some(result) = tracker.observe(status) {
            return result;
        }
    }
    Err(ForgeError::transaction_failed(format!(
        "status stream for {} ended before finality",
        submission.tx_hash
    )))
}

//! Nullable chain: the credentials pallet over an in-memory state.

use forge_crypto::{
    blake2_256, credential_id_for, encode_ss58, extrinsic_hash, GENERIC_SS58_PREFIX,
};
use forge_protocol::pallet::{MAX_CREDENTIALS_PER_OWNER, MAX_METADATA_BYTES};
use forge_protocol::{
    ChainCall, ChainEvent, ChainInfo, CredentialEvent, DispatchError, PalletError,
    StoredCredential, Submission, TransportError, TxStatus, DEFAULT_PALLET_INDEX,
};
use forge_types::{AccountId, BlockHash, CredentialId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A deterministic development account derived from a single seed byte.
pub fn dev_account(seed: u8) -> AccountId {
    encode_ss58(&[seed; 32], GENERIC_SS58_PREFIX)
}

struct HeldSubmission {
    sender: mpsc::UnboundedSender<TxStatus>,
    statuses: Vec<TxStatus>,
}

#[derive(Default)]
struct ChainState {
    credentials: HashMap<CredentialId, StoredCredential>,
    owners: HashMap<AccountId, Vec<CredentialId>>,
    nonces: HashMap<AccountId, u64>,
    block_number: u64,
    submitted: Vec<ChainCall>,
    failing_reads: usize,
    read_failure: Option<TransportError>,
    broken_ids: HashSet<CredentialId>,
    next_dispatch_error: Option<DispatchError>,
    next_pool_error: Option<String>,
    duplicate_finalized: bool,
    hold_finalization: bool,
    held: Vec<HeldSubmission>,
}

/// A shared in-memory credentials pallet.
///
/// Clones share state, so a test can keep one clone for seeding and
/// assertions while the transport holds another.
#[derive(Clone, Default)]
pub struct NullChain {
    state: Arc<Mutex<ChainState>>,
}

impl NullChain {
    pub const GENESIS: BlockHash = BlockHash::new([0x42; 32]);
    pub const SPEC_VERSION: u32 = 100;
    pub const TRANSACTION_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Store `metadata` under its content hash for `owner`, as a mint would.
    pub fn seed(&self, owner: &AccountId, metadata: &[u8]) -> CredentialId {
        let id = credential_id_for(metadata);
        self.insert_raw(owner, id, metadata.to_vec());
        id
    }

    /// Store arbitrary bytes under an arbitrary id, bypassing every rule.
    pub fn insert_raw(&self, owner: &AccountId, id: CredentialId, metadata: Vec<u8>) {
        let mut state = self.state.lock().unwrap();
        state.credentials.insert(
            id,
            StoredCredential {
                owner: owner.clone(),
                metadata,
            },
        );
        state.owners.entry(owner.clone()).or_default().push(id);
    }

    /// Add `id` to the owner index without a backing record.
    pub fn insert_dangling(&self, owner: &AccountId, id: CredentialId) {
        let mut state = self.state.lock().unwrap();
        state.owners.entry(owner.clone()).or_default().push(id);
    }

    /// Fail the next `n` storage reads with a timeout.
    pub fn fail_next_reads(&self, n: usize) {
        self.fail_next_reads_with(n, TransportError::Timeout("storage read timed out".into()));
    }

    /// Fail the next `n` storage reads with `error`.
    pub fn fail_next_reads_with(&self, n: usize, error: TransportError) {
        let mut state = self.state.lock().unwrap();
        state.failing_reads = n;
        state.read_failure = Some(error);
    }

    /// Make every read of `id` fail.
    pub fn break_record(&self, id: CredentialId) {
        self.state.lock().unwrap().broken_ids.insert(id);
    }

    /// The next extrinsic is included but fails dispatch with `error`.
    pub fn fail_next_dispatch(&self, error: DispatchError) {
        self.state.lock().unwrap().next_dispatch_error = Some(error);
    }

    /// The next extrinsic is dropped by the pool with `reason`.
    pub fn drop_next_submission(&self, reason: &str) {
        self.state.lock().unwrap().next_pool_error = Some(reason.to_string());
    }

    /// Report finalization twice for every extrinsic.
    pub fn duplicate_finalization(&self, enabled: bool) {
        self.state.lock().unwrap().duplicate_finalized = enabled;
    }

    /// Stop after `InBlock` until [`NullChain::release_held`] is called.
    pub fn hold_finalization(&self, enabled: bool) {
        self.state.lock().unwrap().hold_finalization = enabled;
    }

    /// Deliver every status withheld by [`NullChain::hold_finalization`].
    pub fn release_held(&self) {
        let held = std::mem::take(&mut self.state.lock().unwrap().held);
        for submission in held {
            for status in submission.statuses {
                let _ = submission.sender.send(status);
            }
        }
    }

    pub fn submitted(&self) -> Vec<ChainCall> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn credential_count(&self) -> usize {
        self.state.lock().unwrap().credentials.len()
    }

    pub fn stored(&self, id: &CredentialId) -> Option<StoredCredential> {
        self.state.lock().unwrap().credentials.get(id).cloned()
    }

    pub fn info(&self) -> ChainInfo {
        ChainInfo {
            chain: "FreelanceForge Null".to_string(),
            node_name: "null-node".to_string(),
            node_version: "0.0.0".to_string(),
            genesis_hash: Self::GENESIS,
            spec_version: Self::SPEC_VERSION,
            transaction_version: Self::TRANSACTION_VERSION,
        }
    }

    pub(crate) fn next_nonce(&self, account: &AccountId) -> u64 {
        let mut state = self.state.lock().unwrap();
        let nonce = state.nonces.entry(account.clone()).or_default();
        let current = *nonce;
        *nonce += 1;
        current
    }

    fn take_read_failure(state: &mut ChainState) -> Result<(), TransportError> {
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(state.read_failure.clone().unwrap_or(TransportError::Closed));
        }
        Ok(())
    }

    pub(crate) fn read_owner_index(
        &self,
        owner: &AccountId,
    ) -> Result<Vec<CredentialId>, TransportError> {
        let mut state = self.state.lock().unwrap();
        Self::take_read_failure(&mut state)?;
        Ok(state.owners.get(owner).cloned().unwrap_or_default())
    }

    pub(crate) fn read_credential(
        &self,
        id: &CredentialId,
    ) -> Result<Option<StoredCredential>, TransportError> {
        let mut state = self.state.lock().unwrap();
        Self::take_read_failure(&mut state)?;
        if state.broken_ids.contains(id) {
            return Err(TransportError::Rpc {
                code: -32000,
                message: "Client error: state unavailable".into(),
            });
        }
        Ok(state.credentials.get(id).cloned())
    }

    /// Apply a signed extrinsic and queue its lifecycle.
    pub(crate) fn apply(
        &self,
        extrinsic: &[u8],
        call_data: &[u8],
        signer: &AccountId,
    ) -> Result<Submission, TransportError> {
        let (pallet_index, call) = ChainCall::decode(call_data)?;
        let tx_hash = extrinsic_hash(extrinsic);
        let (sender, statuses) = mpsc::unbounded_channel();

        let mut state = self.state.lock().unwrap();
        state.submitted.push(call.clone());

        if let Some(reason) = state.next_pool_error.take() {
            let _ = sender.send(TxStatus::Pending);
            let _ = sender.send(TxStatus::Error(reason));
            return Ok(Submission { tx_hash, statuses });
        }

        state.block_number += 1;
        let block_hash = BlockHash::new(blake2_256(&state.block_number.to_le_bytes()));

        let outcome = if pallet_index != DEFAULT_PALLET_INDEX {
            Err(DispatchError::Other(format!("unknown pallet index {pallet_index}")))
        } else if let Some(error) = state.next_dispatch_error.take() {
            Err(error)
        } else {
            dispatch(&mut state, &call, signer)
        };

        let events = match outcome {
            Ok(event) => vec![ChainEvent::Credential(event), ChainEvent::ExtrinsicSuccess],
            Err(error) => vec![ChainEvent::ExtrinsicFailed(error)],
        };

        let _ = sender.send(TxStatus::Pending);
        let _ = sender.send(TxStatus::InBlock(block_hash));
        let mut finality = vec![TxStatus::Finalized { block_hash, events }];
        if state.duplicate_finalized {
            finality.push(finality[0].clone());
        }

        if state.hold_finalization {
            state.held.push(HeldSubmission {
                sender,
                statuses: finality,
            });
        } else {
            for status in finality {
                let _ = sender.send(status);
            }
        }
        Ok(Submission { tx_hash, statuses })
    }
}

fn owned_record<'a>(
    state: &'a ChainState,
    id: &CredentialId,
    signer: &AccountId,
) -> Result<&'a StoredCredential, DispatchError> {
    let record = state
        .credentials
        .get(id)
        .ok_or_else(|| DispatchError::credentials(PalletError::CredentialNotFound))?;
    if &record.owner != signer {
        return Err(DispatchError::credentials(PalletError::NotCredentialOwner));
    }
    Ok(record)
}

fn dispatch(
    state: &mut ChainState,
    call: &ChainCall,
    signer: &AccountId,
) -> Result<CredentialEvent, DispatchError> {
    match call {
        ChainCall::Mint { metadata } => {
            if metadata.len() > MAX_METADATA_BYTES {
                return Err(DispatchError::credentials(PalletError::MetadataTooLarge));
            }
            let id = credential_id_for(metadata);
            if state.credentials.contains_key(&id) {
                return Err(DispatchError::credentials(PalletError::CredentialAlreadyExists));
            }
            let owned = state.owners.get(signer).map_or(0, Vec::len);
            if owned >= MAX_CREDENTIALS_PER_OWNER {
                return Err(DispatchError::credentials(PalletError::TooManyCredentials));
            }
            state.credentials.insert(
                id,
                StoredCredential {
                    owner: signer.clone(),
                    metadata: metadata.clone(),
                },
            );
            state.owners.entry(signer.clone()).or_default().push(id);
            Ok(CredentialEvent::Minted {
                id,
                owner: signer.clone(),
            })
        }
        ChainCall::Update { id, metadata } => {
            owned_record(state, id, signer)?;
            if metadata.len() > MAX_METADATA_BYTES {
                return Err(DispatchError::credentials(PalletError::MetadataTooLarge));
            }
            if let Some(record) = state.credentials.get_mut(id) {
                record.metadata = metadata.clone();
            }
            Ok(CredentialEvent::Updated {
                id: *id,
                owner: signer.clone(),
            })
        }
        ChainCall::Delete { id } => {
            owned_record(state, id, signer)?;
            state.credentials.remove(id);
            if let Some(ids) = state.owners.get_mut(signer) {
                ids.retain(|owned| owned != id);
            }
            Ok(CredentialEvent::Deleted {
                id: *id,
                owner: signer.clone(),
            })
        }
    }
}

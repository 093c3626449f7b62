//! Transaction Orchestrator: one signed operation, one outcome.
//!
//! Every operation runs the same pipeline:
//!
//! 1. local validation and encoding, with no network traffic
//! 2. the in-flight guard for the operation's dedup key
//! 3. a live connection, retried with backoff
//! 4. signing and submission, never retried
//! 5. the status stream, settled by its first terminal status

use std::sync::Arc;
use std::time::Duration;

use forge_crypto::credential_id_for;
use forge_metadata::MetadataCodec;
use forge_protocol::{ChainCall, ChainHandle, ChainTransport, CredentialEvent, WalletSigner};
use forge_types::{
    AccountId, CredentialDraft, CredentialId, CredentialMetadata, CredentialUpdate,
    TransactionOutcome,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::connection::ConnectionManager;
use crate::dedup::{DedupKey, InFlight, InFlightGuard};
use crate::metrics::ClientMetrics;
use crate::query::{account_key, CredentialQuery};
use crate::retry::RetryPolicy;
use crate::status::{await_outcome, Settled};
use crate::{ErrorKind, ForgeError};

pub struct TransactionOrchestrator<T: ChainTransport> {
    connection: Arc<ConnectionManager<T>>,
    query: CredentialQuery<T>,
    codec: MetadataCodec,
    retry: RetryPolicy,
    in_flight: InFlight,
    batch_delay: Duration,
    metrics: Option<Arc<ClientMetrics>>,
}

impl<T: ChainTransport> TransactionOrchestrator<T> {
    pub fn new(
        connection: Arc<ConnectionManager<T>>,
        query: CredentialQuery<T>,
        codec: MetadataCodec,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            connection,
            query,
            codec,
            retry,
            in_flight: InFlight::new(),
            batch_delay: Duration::from_secs(1),
            metrics: None,
        }
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Submissions currently holding a dedup key.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Validate, encode and mint a draft.
    pub async fn mint<S: WalletSigner>(
        &self,
        account: &AccountId,
        draft: &CredentialDraft,
        signer: &S,
    ) -> Result<TransactionOutcome, ForgeError> {
        let (metadata, bytes) = self.codec.encode_draft(draft)?;
        self.mint_encoded(account, &metadata, bytes, signer).await
    }

    /// Mint already-typed metadata.
    pub async fn mint_metadata<S: WalletSigner>(
        &self,
        account: &AccountId,
        metadata: &CredentialMetadata,
        signer: &S,
    ) -> Result<TransactionOutcome, ForgeError> {
        let bytes = self.codec.encode(metadata)?;
        self.mint_encoded(account, metadata, bytes, signer).await
    }

    async fn mint_encoded<S: WalletSigner>(
        &self,
        account: &AccountId,
        metadata: &CredentialMetadata,
        bytes: Vec<u8>,
        signer: &S,
    ) -> Result<TransactionOutcome, ForgeError> {
        let caller = account_key(account)?;
        let _guard = self.claim(DedupKey::mint(&caller, metadata), "mint")?;

        let expected_id = credential_id_for(&bytes);
        let settled = self
            .submit(account, &ChainCall::Mint { metadata: bytes }, signer)
            .await?;
        let id = match settled.credential_event() {
            Some(CredentialEvent::Minted { id, .. }) => *id,
            _ => expected_id,
        };
        info!(credential_id = %id, account = %account, "credential minted");
        Ok(settled.outcome.with_credential_id(id))
    }

    /// Mint drafts one after another, pausing between submissions.
    ///
    /// Each draft gets its own result; a failure does not stop the batch.
    pub async fn mint_batch<S: WalletSigner>(
        &self,
        account: &AccountId,
        drafts: &[CredentialDraft],
        signer: &S,
    ) -> Vec<Result<TransactionOutcome, ForgeError>> {
        let mut results = Vec::with_capacity(drafts.len());
        for (index, draft) in drafts.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.batch_delay).await;
            }
            let result = self.mint(account, draft, signer).await;
            if let Err(e) = &result {
                warn!(index, error = %e, "batch entry failed");
            }
            results.push(result);
        }
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        info!(total = drafts.len(), succeeded, "batch mint finished");
        results
    }

    /// Change visibility and/or proof hash, keeping every other field.
    pub async fn update<S: WalletSigner>(
        &self,
        account: &AccountId,
        id: &CredentialId,
        changes: &CredentialUpdate,
        signer: &S,
    ) -> Result<TransactionOutcome, ForgeError> {
        if changes.is_empty() {
            return Err(ForgeError::validation(
                "update must set visibility or proof_hash",
            ));
        }
        let caller = account_key(account)?;
        let _guard = self.claim(DedupKey::update(&caller, id), "update")?;

        let current = match self.query.get(id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(not_found(id)),
            Err(e) if e.kind() == ErrorKind::ValidationError => {
                return Err(not_found(id).with_cause(e));
            }
            Err(e) => return Err(e),
        };
        if account_key(&current.owner).ok() != Some(caller) {
            return Err(ForgeError::new(
                ErrorKind::NotCredentialOwner,
                format!("credential {id} is owned by {}", current.owner),
            ));
        }

        let mut metadata = current.metadata;
        changes.apply_to(&mut metadata);
        let bytes = self.codec.encode(&metadata)?;

        let call = ChainCall::Update {
            id: *id,
            metadata: bytes,
        };
        let settled = self.submit(account, &call, signer).await?;
        info!(credential_id = %id, "credential updated");
        Ok(settled.outcome.with_credential_id(*id))
    }

    pub async fn delete<S: WalletSigner>(
        &self,
        account: &AccountId,
        id: &CredentialId,
        signer: &S,
    ) -> Result<TransactionOutcome, ForgeError> {
        let caller = account_key(account)?;
        let _guard = self.claim(DedupKey::delete(&caller, id), "delete")?;
        let settled = self
            .submit(account, &ChainCall::Delete { id: *id }, signer)
            .await?;
        info!(credential_id = %id, "credential deleted");
        Ok(settled.outcome.with_credential_id(*id))
    }

    fn claim(&self, key: DedupKey, operation: &str) -> Result<InFlightGuard, ForgeError> {
        self.in_flight.try_acquire(key).ok_or_else(|| {
            debug!(operation, "duplicate submission rejected");
            ForgeError::transaction_failed(format!("{operation} already in progress"))
        })
    }

    async fn submit<S: WalletSigner>(
        &self,
        account: &AccountId,
        call: &ChainCall,
        signer: &S,
    ) -> Result<Settled, ForgeError> {
        let handle = self.connection.connect_with_retry(&self.retry).await?;
        debug!(call = %call, endpoint = handle.endpoint(), "submitting");

        let started = Instant::now();
        let result = match handle.submit(call, account, signer).await {
            Ok(submission) => {
                if let Some(m) = &self.metrics {
                    m.transactions_submitted.inc();
                }
                debug!(tx_hash = %submission.tx_hash, kind = call.kind(), "submitted");
                await_outcome(submission).await
            }
            Err(e) => Err(ForgeError::from(e)),
        };
        self.observe(call, &result, started.elapsed());
        result
    }

    fn observe(&self, call: &ChainCall, result: &Result<Settled, ForgeError>, elapsed: Duration) {
        match result {
            Ok(_) => {
                if let Some(m) = &self.metrics {
                    m.transactions_finalized.inc();
                    m.finality_latency_ms.observe(elapsed.as_secs_f64() * 1000.0);
                }
            }
            Err(e) if e.is_user_cancelled() => {
                info!(kind = call.kind(), "signing cancelled by user");
                if let Some(m) = &self.metrics {
                    m.transactions_cancelled.inc();
                }
            }
            Err(e) => {
                warn!(kind = call.kind(), error = %e, "transaction failed");
                if let Some(m) = &self.metrics {
                    m.transactions_failed.inc();
                }
            }
        }
    }
}

fn not_found(id: &CredentialId) -> ForgeError {
    ForgeError::new(
        ErrorKind::CredentialNotFound,
        format!("credential {id} not found"),
    )
}

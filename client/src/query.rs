//! Credential Query Service.

use std::sync::Arc;

use forge_crypto::decode_ss58;
use forge_metadata::MetadataCodec;
use forge_protocol::{ChainHandle, ChainTransport, StoredCredential};
use forge_types::{AccountId, CredentialId, CredentialRecord};
use tracing::{debug, warn};

use crate::connection::ConnectionManager;
use crate::metrics::ClientMetrics;
use crate::retry::RetryPolicy;
use crate::ForgeError;

/// Public key behind an SS58 address, or `VALIDATION_ERROR`.
pub(crate) fn account_key(account: &AccountId) -> Result<[u8; 32], ForgeError> {
    decode_ss58(account.as_str())
        .map(|address| address.public_key)
        .map_err(|e| ForgeError::validation(format!("invalid account {account}: {e}")).with_cause(e))
}

/// Reads credentials through the shared connection.
///
/// Every storage read runs under the retry policy; a single unreadable
/// record never fails a listing.
pub struct CredentialQuery<T: ChainTransport> {
    connection: Arc<ConnectionManager<T>>,
    codec: MetadataCodec,
    retry: RetryPolicy,
    metrics: Option<Arc<ClientMetrics>>,
}

impl<T: ChainTransport> Clone for CredentialQuery<T> {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            codec: self.codec,
            retry: self.retry,
            metrics: self.metrics.clone(),
        }
    }
}

impl<T: ChainTransport> CredentialQuery<T> {
    pub fn new(
        connection: Arc<ConnectionManager<T>>,
        codec: MetadataCodec,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            connection,
            codec,
            retry,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Every decodable credential `owner` holds, newest first.
    pub async fn list(&self, owner: &AccountId) -> Result<Vec<CredentialRecord>, ForgeError> {
        account_key(owner)?;
        let connection = &self.connection;
        let ids = self
            .retry
            .run("read owner index", move || async move {
                let handle = connection.connect().await?;
                Ok::<_, ForgeError>(handle.owner_index(owner).await?)
            })
            .await?;
        debug!(owner = %owner, count = ids.len(), "read owner index");

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get(&id).await {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {
                    warn!(credential_id = %id, "indexed credential missing from storage, skipping");
                    self.record_skipped();
                }
                Err(e) => {
                    warn!(credential_id = %id, error = %e, "unreadable credential, skipping");
                    self.record_skipped();
                }
            }
        }

        records.sort_by(|a, b| b.metadata.timestamp.cmp(&a.metadata.timestamp));
        Ok(records)
    }

    /// One credential, or `None` when storage has no entry for `id`.
    ///
    /// Bytes that match no known layout are a `VALIDATION_ERROR`.
    pub async fn get(&self, id: &CredentialId) -> Result<Option<CredentialRecord>, ForgeError> {
        let Some(stored) = self.read(id).await? else {
            return Ok(None);
        };
        let metadata = self.codec.decode(stored.metadata)?;
        Ok(Some(CredentialRecord::new(*id, stored.owner, metadata)))
    }

    async fn read(&self, id: &CredentialId) -> Result<Option<StoredCredential>, ForgeError> {
        let connection = &self.connection;
        self.retry
            .run("read credential", move || async move {
                let handle = connection.connect().await?;
                Ok::<_, ForgeError>(handle.credential(id).await?)
            })
            .await
    }

    fn record_skipped(&self) {
        if let Some(m) = &self.metrics {
            m.records_skipped.inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use forge_nullables::{dev_account, NullChain, NullTransport};
    use forge_protocol::TransportError;
    use std::time::Duration;

    fn query(chain: &NullChain) -> CredentialQuery<NullTransport> {
        let connection = Arc::new(ConnectionManager::new(
            NullTransport::new(chain.clone()),
            vec!["ws://node:9944".into()],
            Duration::from_millis(100),
            Duration::from_millis(100),
        ));
        let retry = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        };
        CredentialQuery::new(connection, MetadataCodec::default(), retry)
    }

    #[tokio::test]
    async fn empty_index_is_an_empty_list() {
        let chain = NullChain::new();
        assert!(query(&chain).list(&dev_account(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_owner_is_rejected_before_reading() {
        let chain = NullChain::new();
        let q = query(&chain);
        let err = q.list(&AccountId::new("not-an-address")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(q.connection.transport().attempts().is_empty());
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let chain = NullChain::new();
        let alice = dev_account(1);
        chain.seed(&alice, br#"{"t":"s","n":"Old","i":"A","ts":1600000000,"v":1}"#);
        chain.seed(&alice, br#"{"t":"s","n":"New","i":"A","ts":1700000000,"v":1}"#);
        chain.seed(&alice, b"c|Mid|B|1650000000|0");

        let names: Vec<_> = query(&chain)
            .list(&alice)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.metadata.name)
            .collect();
        assert_eq!(names, ["New", "Mid", "Old"]);
    }

    #[tokio::test]
    async fn transient_read_failures_are_retried() {
        let chain = NullChain::new();
        let alice = dev_account(1);
        let id = chain.seed(&alice, br#"{"t":"s","n":"Rust","i":"A","ts":1700000000,"v":1}"#);
        chain.fail_next_reads(2);

        let record = query(&chain).get(&id).await.unwrap().unwrap();
        assert_eq!(record.metadata.name, "Rust");
        assert_eq!(record.owner, alice);
    }

    #[tokio::test]
    async fn node_errors_on_reads_are_retried() {
        let chain = NullChain::new();
        let alice = dev_account(1);
        chain.seed(&alice, br#"{"t":"s","n":"Rust","i":"A","ts":1700000000,"v":1}"#);
        chain.fail_next_reads_with(
            2,
            TransportError::Rpc {
                code: -32000,
                message: "Client error: state unavailable".into(),
            },
        );

        let records = query(&chain).list(&alice).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].metadata.name, "Rust");
    }

    #[tokio::test]
    async fn exhausted_node_errors_surface_network_error() {
        let chain = NullChain::new();
        chain.fail_next_reads_with(
            3,
            TransportError::Rpc {
                code: -32000,
                message: "Client error: state unavailable".into(),
            },
        );
        let err = query(&chain).list(&dev_account(1)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert!(err.message().contains("read owner index failed after 3 attempts"));
    }

    #[tokio::test]
    async fn persistent_failure_surfaces_network_error() {
        let chain = NullChain::new();
        let id = chain.seed(&dev_account(1), br#"{"t":"s","n":"Rust","i":"A","ts":1,"v":1}"#);
        chain.break_record(id);

        let err = query(&chain).get(&id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkError);
        assert!(err.message().contains("after 3 attempts"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn absent_and_malformed_records() {
        let chain = NullChain::new();
        let q = query(&chain);
        assert!(q.get(&CredentialId::new([5; 32])).await.unwrap().is_none());

        let id = chain.seed(&dev_account(1), b"\xff\xfe not metadata");
        assert_eq!(
            q.get(&id).await.unwrap_err().kind(),
            ErrorKind::ValidationError
        );
    }
}

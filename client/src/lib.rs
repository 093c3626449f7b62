//! FreelanceForge chain client.
//!
//! [`ForgeClient`] is the one object an application constructs. It owns:
//! - the [`ConnectionManager`]: a single shared, ready chain handle chosen
//!   from a ranked endpoint list, with failover
//! - the [`TransactionOrchestrator`]: mint, update and delete as signed
//!   extrinsics, each settling to exactly one [`TransactionOutcome`]
//! - the [`CredentialQuery`] service: owner listings and single fetches,
//!   tolerant of individual unreadable records
//!
//! Every failure is a [`ForgeError`] classified into the closed [`ErrorKind`]
//! taxonomy.

pub mod classify;
pub mod config;
pub mod connection;
pub mod dedup;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod portfolio;
pub mod query;
pub mod retry;
pub mod status;

pub use classify::{classify_dispatch, classify_message, kind_for_module_error};
pub use config::{ClientConfig, ConfigError, EndpointConfig, RetryConfig};
pub use connection::{ConnectionManager, ConnectionState};
pub use dedup::{DedupKey, InFlight};
pub use error::{ErrorKind, ErrorPayload, ForgeError};
pub use metrics::ClientMetrics;
pub use orchestrator::TransactionOrchestrator;
pub use portfolio::Portfolio;
pub use query::CredentialQuery;
pub use retry::RetryPolicy;
pub use status::{await_outcome, Settled, StatusTracker};

use std::sync::Arc;

use chrono::Utc;
use forge_protocol::{ChainHandle, ChainInfo, ChainTransport, WalletSigner};
use forge_types::{
    AccountId, CredentialDraft, CredentialId, CredentialMetadata, CredentialRecord,
    CredentialUpdate, TransactionOutcome,
};
use serde::Serialize;

/// Node identification plus the endpoint that answered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChainDiagnostics {
    pub endpoint: String,
    #[serde(flatten)]
    pub info: ChainInfo,
}

pub struct ForgeClient<T: ChainTransport> {
    config: ClientConfig,
    connection: Arc<ConnectionManager<T>>,
    query: CredentialQuery<T>,
    orchestrator: TransactionOrchestrator<T>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl<T: ChainTransport> ForgeClient<T> {
    /// Build a client over `transport`. Nothing connects until first use.
    pub fn new(transport: T, config: ClientConfig) -> Result<Self, ConfigError> {
        Self::build(transport, config, None)
    }

    pub fn with_metrics(
        transport: T,
        config: ClientConfig,
        metrics: Arc<ClientMetrics>,
    ) -> Result<Self, ConfigError> {
        Self::build(transport, config, Some(metrics))
    }

    fn build(
        transport: T,
        config: ClientConfig,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let codec = config.codec();
        let retry = config.retry_policy();

        let mut connection = ConnectionManager::new(
            transport,
            config.active_endpoints().to_vec(),
            config.connect_timeout(),
            config.ready_timeout(),
        );
        if let Some(m) = &metrics {
            connection = connection.with_metrics(Arc::clone(m));
        }
        let connection = Arc::new(connection);

        let mut query = CredentialQuery::new(Arc::clone(&connection), codec, retry);
        if let Some(m) = &metrics {
            query = query.with_metrics(Arc::clone(m));
        }
        let mut orchestrator =
            TransactionOrchestrator::new(Arc::clone(&connection), query.clone(), codec, retry)
                .with_batch_delay(config.batch_delay());
        if let Some(m) = &metrics {
            orchestrator = orchestrator.with_metrics(Arc::clone(m));
        }

        Ok(Self {
            config,
            connection,
            query,
            orchestrator,
            metrics,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn connection(&self) -> &ConnectionManager<T> {
        &self.connection
    }

    pub fn metrics(&self) -> Option<&ClientMetrics> {
        self.metrics.as_deref()
    }

    /// Open the shared connection, one sweep over the endpoints.
    pub async fn connect(&self) -> Result<(), ForgeError> {
        self.connection.connect().await.map(|_| ())
    }

    pub async fn disconnect(&self) {
        self.connection.disconnect().await
    }

    pub async fn chain_info(&self) -> Result<ChainDiagnostics, ForgeError> {
        let connection = &self.connection;
        self.config
            .retry_policy()
            .run("read chain info", move || async move {
                let handle = connection.connect().await?;
                let info = handle.chain_info().await?;
                Ok::<_, ForgeError>(ChainDiagnostics {
                    endpoint: handle.endpoint().to_string(),
                    info,
                })
            })
            .await
    }

    pub async fn mint<S: WalletSigner>(
        &self,
        account: &AccountId,
        draft: &CredentialDraft,
        signer: &S,
    ) -> Result<TransactionOutcome, ForgeError> {
        self.orchestrator.mint(account, draft, signer).await
    }

    pub async fn mint_metadata<S: WalletSigner>(
        &self,
        account: &AccountId,
        metadata: &CredentialMetadata,
        signer: &S,
    ) -> Result<TransactionOutcome, ForgeError> {
        self.orchestrator.mint_metadata(account, metadata, signer).await
    }

    pub async fn mint_batch<S: WalletSigner>(
        &self,
        account: &AccountId,
        drafts: &[CredentialDraft],
        signer: &S,
    ) -> Vec<Result<TransactionOutcome, ForgeError>> {
        self.orchestrator.mint_batch(account, drafts, signer).await
    }

    pub async fn update<S: WalletSigner>(
        &self,
        account: &AccountId,
        id: &CredentialId,
        changes: &CredentialUpdate,
        signer: &S,
    ) -> Result<TransactionOutcome, ForgeError> {
        self.orchestrator.update(account, id, changes, signer).await
    }

    pub async fn delete<S: WalletSigner>(
        &self,
        account: &AccountId,
        id: &CredentialId,
        signer: &S,
    ) -> Result<TransactionOutcome, ForgeError> {
        self.orchestrator.delete(account, id, signer).await
    }

    pub async fn list(&self, owner: &AccountId) -> Result<Vec<CredentialRecord>, ForgeError> {
        self.query.list(owner).await
    }

    pub async fn get(&self, id: &CredentialId) -> Result<Option<CredentialRecord>, ForgeError> {
        self.query.get(id).await
    }

    /// `owner`'s public credentials with per-type counts.
    pub async fn export_portfolio(&self, owner: &AccountId) -> Result<Portfolio, ForgeError> {
        let records = self.query.list(owner).await?;
        Ok(Portfolio::build(owner.clone(), records, Utc::now()))
    }
}

//! Nullable transport: connect to a [`NullChain`] instead of a node.

use forge_protocol::{
    build_signed_extrinsic, ChainCall, ChainHandle, ChainInfo, ChainTransport, SignerPayload,
    StoredCredential, Submission, TransportError, WalletSigner, DEFAULT_PALLET_INDEX,
};
use forge_types::{AccountId, CredentialId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::NullChain;

/// How an endpoint responds to a connection attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointBehavior {
    /// Connects and becomes ready.
    Accept,
    /// Fails immediately.
    Refuse,
    /// Connects but never becomes ready.
    NeverReady,
    /// Never answers the connection attempt.
    Hang,
}

/// A transport whose endpoints all lead to one [`NullChain`].
///
/// Endpoints without a configured behavior accept.
pub struct NullTransport {
    chain: NullChain,
    behaviors: Mutex<HashMap<String, EndpointBehavior>>,
    attempts: Mutex<Vec<String>>,
    next_handle: AtomicU64,
}

impl NullTransport {
    pub fn new(chain: NullChain) -> Self {
        Self {
            chain,
            behaviors: Mutex::new(HashMap::new()),
            attempts: Mutex::new(Vec::new()),
            next_handle: AtomicU64::new(1),
        }
    }

    pub fn with_behavior(self, endpoint: &str, behavior: EndpointBehavior) -> Self {
        self.set_behavior(endpoint, behavior);
        self
    }

    pub fn set_behavior(&self, endpoint: &str, behavior: EndpointBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), behavior);
    }

    /// Every endpoint a connection was attempted to, in order.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn chain(&self) -> &NullChain {
        &self.chain
    }
}

impl ChainTransport for NullTransport {
    type Handle = NullHandle;

    async fn connect(&self, endpoint: &str) -> Result<NullHandle, TransportError> {
        self.attempts.lock().unwrap().push(endpoint.to_string());
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(endpoint)
            .copied()
            .unwrap_or(EndpointBehavior::Accept);

        tokio::task::yield_now().await;
        match behavior {
            EndpointBehavior::Refuse => {
                Err(TransportError::Connect(format!("{endpoint}: connection refused")))
            }
            EndpointBehavior::Hang => std::future::pending().await,
            EndpointBehavior::Accept | EndpointBehavior::NeverReady => Ok(NullHandle {
                id: self.next_handle.fetch_add(1, Ordering::Relaxed),
                endpoint: endpoint.to_string(),
                ready: behavior == EndpointBehavior::Accept,
                connected: Arc::new(AtomicBool::new(true)),
                chain: self.chain.clone(),
            }),
        }
    }
}

/// A live connection to a [`NullChain`].
#[derive(Clone)]
pub struct NullHandle {
    id: u64,
    endpoint: String,
    ready: bool,
    connected: Arc<AtomicBool>,
    chain: NullChain,
}

impl fmt::Debug for NullHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NullHandle")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("connected", &self.connected.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl NullHandle {
    /// Distinct per successful connect; clones share it.
    pub fn id(&self) -> u64 {
        self.id
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TransportError::Closed)
        }
    }
}

impl ChainHandle for NullHandle {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn wait_ready(&self) -> Result<(), TransportError> {
        if !self.ready {
            std::future::pending::<()>().await;
        }
        self.ensure_connected()
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    async fn chain_info(&self) -> Result<ChainInfo, TransportError> {
        self.ensure_connected()?;
        Ok(self.chain.info())
    }

    async fn owner_index(&self, owner: &AccountId) -> Result<Vec<CredentialId>, TransportError> {
        self.ensure_connected()?;
        tokio::task::yield_now().await;
        self.chain.read_owner_index(owner)
    }

    async fn credential(
        &self,
        id: &CredentialId,
    ) -> Result<Option<StoredCredential>, TransportError> {
        self.ensure_connected()?;
        tokio::task::yield_now().await;
        self.chain.read_credential(id)
    }

    async fn submit<S: WalletSigner>(
        &self,
        call: &ChainCall,
        account: &AccountId,
        signer: &S,
    ) -> Result<Submission, TransportError> {
        self.ensure_connected()?;
        let payload = SignerPayload {
            account: account.clone(),
            call_data: call.encode(DEFAULT_PALLET_INDEX),
            nonce: self.chain.next_nonce(account),
            genesis_hash: NullChain::GENESIS,
            spec_version: NullChain::SPEC_VERSION,
            transaction_version: NullChain::TRANSACTION_VERSION,
        };
        let signature = signer.sign(&payload).await?;
        let extrinsic = build_signed_extrinsic(&payload, &signature)?;
        self.chain.apply(&extrinsic, &payload.call_data, account)
    }
}

//! [`ChainTransport`] over WebSocket JSON-RPC.

use std::sync::Arc;
use std::time::{Duration, Instant};

use forge_crypto::{extrinsic_hash, GENERIC_SS58_PREFIX};
use forge_protocol::storage::{
    credential_key, decode_credential_entry, decode_owner_index, owner_credentials_key,
};
use forge_protocol::{
    build_signed_extrinsic, ChainCall, ChainHandle, ChainInfo, ChainTransport, SignerPayload,
    StoredCredential, Submission, TransportError, TxStatus, WalletSigner, DEFAULT_PALLET_INDEX,
};
use forge_types::{AccountId, BlockHash, CredentialId};
use serde_json::{json, Value};
use tokio::sync::{mpsc, OnceCell};
use tracing::{debug, info, warn};

use crate::client::{RpcClient, Subscription, DEFAULT_REQUEST_TIMEOUT};
use crate::inference::{infer_events, touched_credential, StorageDiff};
use crate::watch::{block_hash, parse_update, ExtrinsicUpdate};
use crate::RpcError;

/// Opens [`WsHandle`]s to Substrate nodes running the credentials pallet.
#[derive(Clone, Debug)]
pub struct WsTransport {
    pallet_index: u8,
    ss58_prefix: u16,
    request_timeout: Duration,
}

impl WsTransport {
    pub fn new(pallet_index: u8, ss58_prefix: u16) -> Self {
        Self {
            pallet_index,
            ss58_prefix,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for WsTransport {
    fn default() -> Self {
        Self::new(DEFAULT_PALLET_INDEX, GENERIC_SS58_PREFIX)
    }
}

impl ChainTransport for WsTransport {
    type Handle = WsHandle;

    async fn connect(&self, endpoint: &str) -> Result<WsHandle, TransportError> {
        let client = RpcClient::connect(endpoint, self.request_timeout).await?;
        Ok(WsHandle {
            inner: Arc::new(HandleInner {
                client,
                pallet_index: self.pallet_index,
                ss58_prefix: self.ss58_prefix,
                runtime: OnceCell::new(),
            }),
        })
    }
}

/// Values every signed extrinsic commits to.
#[derive(Clone, Copy, Debug)]
struct Runtime {
    genesis_hash: BlockHash,
    spec_version: u32,
    transaction_version: u32,
}

struct HandleInner {
    client: RpcClient,
    pallet_index: u8,
    ss58_prefix: u16,
    runtime: OnceCell<Runtime>,
}

/// A connection to one node. Clones share the socket.
#[derive(Clone)]
pub struct WsHandle {
    inner: Arc<HandleInner>,
}

fn hex_param(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn string_field(value: &Value, field: &str) -> Result<String, TransportError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| TransportError::Decode(format!("{field} is not a string")))
}

fn u32_field(value: &Value, field: &str) -> Result<u32, TransportError> {
    value
        .get(field)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| TransportError::Decode(format!("runtime version lacks {field}")))
}

impl WsHandle {
    fn client(&self) -> &RpcClient {
        &self.inner.client
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
        Ok(self.client().request(method, params).await?)
    }

    async fn runtime(&self) -> Result<Runtime, TransportError> {
        self.inner
            .runtime
            .get_or_try_init(|| self.fetch_runtime())
            .await
            .copied()
    }

    async fn fetch_runtime(&self) -> Result<Runtime, TransportError> {
        let (genesis, version) = tokio::try_join!(
            self.request("chain_getBlockHash", json!([0])),
            self.request("state_getRuntimeVersion", json!([])),
        )?;
        let runtime = Runtime {
            genesis_hash: block_hash(&genesis)?,
            spec_version: u32_field(&version, "specVersion")?,
            transaction_version: u32_field(&version, "transactionVersion")?,
        };
        debug!(
            endpoint = self.endpoint(),
            genesis = %runtime.genesis_hash,
            spec_version = runtime.spec_version,
            "runtime identified"
        );
        Ok(runtime)
    }

    /// Raw storage value, at `at` or the best block.
    async fn storage(
        &self,
        key: &[u8],
        at: Option<BlockHash>,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        let params = match at {
            Some(block) => json!([hex_param(key), block.to_hex()]),
            None => json!([hex_param(key)]),
        };
        match self.request("state_getStorage", params).await? {
            Value::Null => Ok(None),
            Value::String(text) => {
                let digits = text.strip_prefix("0x").unwrap_or(&text);
                hex::decode(digits)
                    .map(Some)
                    .map_err(|e| TransportError::Decode(format!("storage value: {e}")))
            }
            other => Err(TransportError::Decode(format!("storage value {other}"))),
        }
    }

    async fn owner_index_at(
        &self,
        owner: &AccountId,
        at: Option<BlockHash>,
    ) -> Result<Vec<CredentialId>, TransportError> {
        let key = owner_credentials_key(owner)
            .map_err(|e| TransportError::InvalidAddress(format!("{owner}: {e}")))?;
        match self.storage(&key, at).await? {
            Some(bytes) => Ok(decode_owner_index(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn credential_at(
        &self,
        id: &CredentialId,
        at: Option<BlockHash>,
    ) -> Result<Option<StoredCredential>, TransportError> {
        match self.storage(&credential_key(id), at).await? {
            Some(bytes) => Ok(Some(decode_credential_entry(&bytes, self.inner.ss58_prefix)?)),
            None => Ok(None),
        }
    }

    /// Replay the pallet's checks against storage either side of `block`.
    async fn settle(
        &self,
        call: &ChainCall,
        signer: &AccountId,
        block: BlockHash,
    ) -> Result<TxStatus, TransportError> {
        let header = self.request("chain_getHeader", json!([block.to_hex()])).await?;
        let parent = header
            .get("parentHash")
            .map(block_hash)
            .transpose()?
            .ok_or_else(|| TransportError::Decode("header lacks parentHash".into()))?;

        let id = touched_credential(call);
        let (before, after) = tokio::try_join!(
            self.credential_at(&id, Some(parent)),
            self.credential_at(&id, Some(block)),
        )?;
        let owned_before = match call {
            ChainCall::Mint { .. } => self.owner_index_at(signer, Some(parent)).await?.len(),
            _ => 0,
        };
        let diff = StorageDiff {
            before,
            after,
            owned_before,
        };
        Ok(TxStatus::Finalized {
            block_hash: block,
            events: infer_events(call, signer, &diff),
        })
    }

    /// Forward a watched extrinsic's updates until it settles.
    async fn watch(
        self,
        mut subscription: Subscription,
        call: ChainCall,
        signer: AccountId,
        statuses: mpsc::UnboundedSender<TxStatus>,
    ) {
        let started = Instant::now();
        while let Some(notification) = subscription.notifications.recv().await {
            let update = match parse_update(&notification) {
                Ok(update) => update,
                Err(e) => {
                    warn!(subscription = %subscription.id, error = %e, "ignoring extrinsic update");
                    continue;
                }
            };
            let status = match update {
                ExtrinsicUpdate::Progress(state) => {
                    debug!(subscription = %subscription.id, state = %state, "extrinsic progress");
                    TxStatus::Pending
                }
                ExtrinsicUpdate::InBlock(block) => TxStatus::InBlock(block),
                ExtrinsicUpdate::Finalized(block) => {
                    let status = match self.settle(&call, &signer, block).await {
                        Ok(status) => status,
                        Err(e) => TxStatus::Error(format!(
                            "finalized in {block} but its outcome could not be read: {e}"
                        )),
                    };
                    info!(
                        endpoint = self.endpoint(),
                        block = %block,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "extrinsic finalized"
                    );
                    let _ = statuses.send(status);
                    return;
                }
                ExtrinsicUpdate::Terminal(reason) => {
                    let _ = statuses.send(TxStatus::Error(reason));
                    return;
                }
            };
            if statuses.send(status).is_err() {
                return;
            }
        }
        debug!(subscription = %subscription.id, "extrinsic watch ended before finality");
    }
}

impl ChainHandle for WsHandle {
    fn endpoint(&self) -> &str {
        self.client().endpoint()
    }

    fn is_connected(&self) -> bool {
        self.client().is_connected()
    }

    async fn wait_ready(&self) -> Result<(), TransportError> {
        self.runtime().await.map(|_| ())
    }

    async fn disconnect(&self) {
        self.client().close().await
    }

    async fn chain_info(&self) -> Result<ChainInfo, TransportError> {
        let (chain, node_name, node_version, runtime) = tokio::try_join!(
            self.request("system_chain", json!([])),
            self.request("system_name", json!([])),
            self.request("system_version", json!([])),
            self.runtime(),
        )?;
        Ok(ChainInfo {
            chain: string_field(&chain, "system_chain")?,
            node_name: string_field(&node_name, "system_name")?,
            node_version: string_field(&node_version, "system_version")?,
            genesis_hash: runtime.genesis_hash,
            spec_version: runtime.spec_version,
            transaction_version: runtime.transaction_version,
        })
    }

    async fn owner_index(&self, owner: &AccountId) -> Result<Vec<CredentialId>, TransportError> {
        self.owner_index_at(owner, None).await
    }

    async fn credential(
        &self,
        id: &CredentialId,
    ) -> Result<Option<StoredCredential>, TransportError> {
        self.credential_at(id, None).await
    }

    async fn submit<S: WalletSigner>(
        &self,
        call: &ChainCall,
        account: &AccountId,
        signer: &S,
    ) -> Result<Submission, TransportError> {
        let runtime = self.runtime().await?;
        let nonce = self
            .request("system_accountNextIndex", json!([account.as_str()]))
            .await?
            .as_u64()
            .ok_or_else(|| TransportError::Decode("account nonce is not an integer".into()))?;

        let payload = SignerPayload {
            account: account.clone(),
            call_data: call.encode(self.inner.pallet_index),
            nonce,
            genesis_hash: runtime.genesis_hash,
            spec_version: runtime.spec_version,
            transaction_version: runtime.transaction_version,
        };
        let signature = signer.sign(&payload).await?;
        let extrinsic = build_signed_extrinsic(&payload, &signature)?;
        let tx_hash = extrinsic_hash(&extrinsic);

        let subscription = self
            .client()
            .subscribe("author_submitAndWatchExtrinsic", json!([hex_param(&extrinsic)]))
            .await
            .map_err(|e| match e {
                RpcError::Node { code, message } => {
                    TransportError::Submit(format!("{message} (code {code})"))
                }
                other => other.into(),
            })?;
        debug!(
            endpoint = self.endpoint(),
            tx_hash = %tx_hash,
            call = call.kind(),
            nonce,
            "extrinsic submitted"
        );

        let (sender, statuses) = mpsc::unbounded_channel();
        tokio::spawn(
            self.clone()
                .watch(subscription, call.clone(), account.clone(), sender),
        );
        Ok(Submission { tx_hash, statuses })
    }
}

//! Seams between the client and the outside world.
//!
//! [`ChainTransport`] opens connections; a [`ChainHandle`] is a live
//! connection that can read pallet storage and submit calls; a
//! [`WalletSigner`] produces signatures on the user's behalf. The WebSocket
//! implementation lives in `forge-rpc` and the deterministic test doubles
//! in `forge-nullables`.

use forge_types::{AccountId, BlockHash, CredentialId};
use serde::Serialize;
use std::future::Future;

use crate::{
    ChainCall, MultiSignature, SignerError, SignerPayload, StoredCredential, Submission,
    TransportError,
};

/// Node and runtime identification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChainInfo {
    pub chain: String,
    pub node_name: String,
    pub node_version: String,
    pub genesis_hash: BlockHash,
    pub spec_version: u32,
    pub transaction_version: u32,
}

pub trait ChainTransport: Send + Sync + 'static {
    type Handle: ChainHandle;

    /// Open a connection. The handle may not be usable until
    /// [`ChainHandle::wait_ready`] resolves.
    fn connect(
        &self,
        endpoint: &str,
    ) -> impl Future<Output = Result<Self::Handle, TransportError>> + Send;
}

pub trait ChainHandle: Clone + Send + Sync + 'static {
    fn endpoint(&self) -> &str;

    fn is_connected(&self) -> bool;

    /// Resolve once the node has answered its initial handshake queries.
    fn wait_ready(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    fn disconnect(&self) -> impl Future<Output = ()> + Send;

    fn chain_info(&self) -> impl Future<Output = Result<ChainInfo, TransportError>> + Send;

    /// `OwnerCredentials(owner)`; empty when the owner has none.
    fn owner_index(
        &self,
        owner: &AccountId,
    ) -> impl Future<Output = Result<Vec<CredentialId>, TransportError>> + Send;

    /// `Credentials(id)`.
    fn credential(
        &self,
        id: &CredentialId,
    ) -> impl Future<Output = Result<Option<StoredCredential>, TransportError>> + Send;

    /// Sign `call` as `account` and submit it, watching its status.
    fn submit<S: WalletSigner>(
        &self,
        call: &ChainCall,
        account: &AccountId,
        signer: &S,
    ) -> impl Future<Output = Result<Submission, TransportError>> + Send;
}

pub trait WalletSigner: Send + Sync {
    /// May prompt the user; rejection is [`SignerError::Rejected`].
    fn sign(
        &self,
        payload: &SignerPayload,
    ) -> impl Future<Output = Result<MultiSignature, SignerError>> + Send;
}

//! Nullable wallet signer: approve or reject without a wallet.

use forge_crypto::blake2_256;
use forge_protocol::{MultiSignature, SignatureScheme, SignerError, SignerPayload, WalletSigner};
use std::sync::Mutex;

enum Behavior {
    Approve,
    Reject(String),
}

/// A signer that records every request and answers as configured.
pub struct NullSigner {
    behavior: Mutex<Behavior>,
    requests: Mutex<Vec<SignerPayload>>,
}

impl NullSigner {
    pub fn approving() -> Self {
        Self {
            behavior: Mutex::new(Behavior::Approve),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reject every request as a user dismissing the wallet prompt would.
    pub fn rejecting(reason: &str) -> Self {
        let signer = Self::approving();
        signer.reject_with(reason);
        signer
    }

    pub fn approve(&self) {
        *self.behavior.lock().unwrap() = Behavior::Approve;
    }

    pub fn reject_with(&self, reason: &str) {
        *self.behavior.lock().unwrap() = Behavior::Reject(reason.to_string());
    }

    /// Every payload this signer was asked to sign.
    pub fn requests(&self) -> Vec<SignerPayload> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for NullSigner {
    fn default() -> Self {
        Self::approving()
    }
}

impl WalletSigner for NullSigner {
    async fn sign(&self, payload: &SignerPayload) -> Result<MultiSignature, SignerError> {
        tokio::task::yield_now().await;
        self.requests.lock().unwrap().push(payload.clone());
        match &*self.behavior.lock().unwrap() {
            Behavior::Approve => {
                let digest = blake2_256(&payload.signing_bytes());
                Ok(MultiSignature {
                    scheme: SignatureScheme::Sr25519,
                    bytes: [digest, digest].concat(),
                })
            }
            Behavior::Reject(reason) => Err(SignerError::Rejected(reason.clone())),
        }
    }
}

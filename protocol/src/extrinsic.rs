//! Signed extrinsic assembly (transaction format v4).
//!
//! ```text
//! extrinsic = compact(len) ++ 0x84 ++ address ++ signature ++ extra ++ call
//! address   = 0x00 ++ public_key            (MultiAddress::Id)
//! signature = scheme ++ signature_bytes     (MultiSignature)
//! extra     = era ++ compact(nonce) ++ compact(tip) ++ metadata_hash_mode
//! ```
//!
//! Transactions are immortal with zero tip and no metadata hash, so the
//! additional signed data is `spec_version ++ tx_version ++ genesis ++
//! genesis ++ None`.

use forge_crypto::{blake2_256, decode_ss58};
use forge_types::{AccountId, BlockHash};

use crate::scale::encode_compact;
use crate::{SignerError, TransportError};

const SIGNED_V4: u8 = 0x84;
const ADDRESS_ID: u8 = 0x00;
const IMMORTAL_ERA: u8 = 0x00;
const METADATA_HASH_DISABLED: u8 = 0x00;
const METADATA_HASH_NONE: u8 = 0x00;
const MAX_UNHASHED_PAYLOAD: usize = 256;

/// Everything a wallet needs to produce a signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerPayload {
    pub account: AccountId,
    pub call_data: Vec<u8>,
    pub nonce: u64,
    pub genesis_hash: BlockHash,
    pub spec_version: u32,
    pub transaction_version: u32,
}

impl SignerPayload {
    /// Signed extensions carried in the extrinsic body.
    pub fn extra(&self) -> Vec<u8> {
        let mut out = vec![IMMORTAL_ERA];
        encode_compact(self.nonce, &mut out);
        encode_compact(0, &mut out);
        out.push(METADATA_HASH_DISABLED);
        out
    }

    /// Signed extension data that is signed but not transmitted.
    pub fn additional_signed(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + 4 + 32 + 32 + 1);
        out.extend_from_slice(&self.spec_version.to_le_bytes());
        out.extend_from_slice(&self.transaction_version.to_le_bytes());
        out.extend_from_slice(self.genesis_hash.as_bytes());
        out.extend_from_slice(self.genesis_hash.as_bytes());
        out.push(METADATA_HASH_NONE);
        out
    }

    /// The exact bytes the signature must cover.
    pub fn signing_bytes(&self) -> Vec<u8> {
        let mut out = self.call_data.clone();
        out.extend(self.extra());
        out.extend(self.additional_signed());
        if out.len() > MAX_UNHASHED_PAYLOAD {
            blake2_256(&out).to_vec()
        } else {
            out
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignatureScheme {
    Ed25519,
    Sr25519,
    Ecdsa,
}

impl SignatureScheme {
    fn tag(&self) -> u8 {
        match self {
            Self::Ed25519 => 0,
            Self::Sr25519 => 1,
            Self::Ecdsa => 2,
        }
    }

    fn signature_len(&self) -> usize {
        match self {
            Self::Ed25519 | Self::Sr25519 => 64,
            Self::Ecdsa => 65,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultiSignature {
    pub scheme: SignatureScheme,
    pub bytes: Vec<u8>,
}

/// Assemble a length-prefixed signed extrinsic ready for submission.
pub fn build_signed_extrinsic(
    payload: &SignerPayload,
    signature: &MultiSignature,
) -> Result<Vec<u8>, TransportError> {
    let signer = decode_ss58(payload.account.as_str())
        .map_err(|e| TransportError::InvalidAddress(format!("{}: {e}", payload.account)))?;
    if signature.bytes.len() != signature.scheme.signature_len() {
        return Err(TransportError::Signer(SignerError::Unavailable(format!(
            "{:?} signature must be {} bytes, got {}",
            signature.scheme,
            signature.scheme.signature_len(),
            signature.bytes.len()
        ))));
    }

    let mut body = vec![SIGNED_V4, ADDRESS_ID];
    body.extend_from_slice(&signer.public_key);
    body.push(signature.scheme.tag());
    body.extend_from_slice(&signature.bytes);
    body.extend(payload.extra());
    body.extend_from_slice(&payload.call_data);

    let mut out = Vec::with_capacity(body.len() + 5);
    encode_compact(body.len() as u64, &mut out);
    out.extend(body);
    Ok(out)
}

//! Blake2b and SHA-256 hashing.

use blake2::digest::consts::{U16, U32};
use blake2::{Blake2b, Digest};
use forge_types::{CredentialId, TxHash};
use sha2::Sha256;

type Blake2b256 = Blake2b<U32>;
type Blake2b128 = Blake2b<U16>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Compute a 128-bit Blake2b hash of arbitrary data.
pub fn blake2_128(data: &[u8]) -> [u8; 16] {
    let mut hasher = Blake2b128::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 16];
    output.copy_from_slice(&result);
    output
}

/// `Blake2_128Concat` map hasher: the 16-byte hash followed by the raw key.
pub fn blake2_128_concat(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + data.len());
    out.extend_from_slice(&blake2_128(data));
    out.extend_from_slice(data);
    out
}

/// The id the pallet assigns to a credential with these exact metadata bytes.
pub fn credential_id_for(metadata: &[u8]) -> CredentialId {
    CredentialId::new(blake2_256(metadata))
}

/// Hash of a signed extrinsic, as the node reports it.
pub fn extrinsic_hash(extrinsic: &[u8]) -> TxHash {
    TxHash::new(blake2_256(extrinsic))
}

/// `0x`-prefixed SHA-256 digest of a proof document.
pub fn proof_hash(document: &[u8]) -> String {
    format!("0x{}", hex::encode(Sha256::digest(document)))
}

//! Cryptographic primitives for the FreelanceForge client.
//!
//! - **Blake2b-256** for credential ids (content addressing) and extrinsic hashes
//! - **Blake2b-128** for `Blake2_128Concat` storage-map keys
//! - **SHA-256** for proof-document hashes
//! - SS58 address encoding and decoding

pub mod error;
pub mod hash;
pub mod ss58;

pub use error::CryptoError;
pub use hash::{
    blake2_128, blake2_128_concat, blake2_256, credential_id_for, extrinsic_hash, proof_hash,
};
pub use ss58::{decode_ss58, encode_ss58, Ss58Address, GENERIC_SS58_PREFIX};

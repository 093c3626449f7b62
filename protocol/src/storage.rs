//! Storage layout of the credentials pallet.
//!
//! ```text
//! Credentials:       map Blake2_128Concat(H256)      -> (AccountId32, BoundedVec<u8, 4096>)
//! OwnerCredentials:  map Blake2_128Concat(AccountId) -> BoundedVec<H256, 500>
//! ```
//!
//! Keys are `twox128(pallet) ++ twox128(item) ++ blake2_128_concat(key)`. The
//! twox prefixes are fixed for the pallet and item names, so they are
//! precomputed here.

use forge_crypto::{blake2_128_concat, decode_ss58, encode_ss58, CryptoError};
use forge_types::{AccountId, CredentialId};

use crate::scale::ScaleReader;
use crate::ScaleError;

/// `twox128("FreelanceCredentials") ++ twox128("Credentials")`
pub const CREDENTIALS_PREFIX: [u8; 32] = [
    0x45, 0xe1, 0x0f, 0x0f, 0x3b, 0x4d, 0xbc, 0x38, 0x6d, 0x77, 0x2d, 0xba, 0x6f, 0xf8, 0x87, 0x9b,
    0x00, 0x99, 0xb1, 0x83, 0x94, 0x24, 0x81, 0xdb, 0x2b, 0x3c, 0x81, 0x60, 0xbd, 0x6a, 0xda, 0xd0,
];

/// `twox128("FreelanceCredentials") ++ twox128("OwnerCredentials")`
pub const OWNER_CREDENTIALS_PREFIX: [u8; 32] = [
    0x45, 0xe1, 0x0f, 0x0f, 0x3b, 0x4d, 0xbc, 0x38, 0x6d, 0x77, 0x2d, 0xba, 0x6f, 0xf8, 0x87, 0x9b,
    0xc1, 0x15, 0x8f, 0x9b, 0x2f, 0xa3, 0x39, 0x60, 0x32, 0x74, 0x79, 0xb9, 0xdb, 0xbd, 0x11, 0x23,
];

/// A `Credentials` entry as stored: owner plus raw metadata bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredCredential {
    pub owner: AccountId,
    pub metadata: Vec<u8>,
}

fn map_key(prefix: &[u8; 32], key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + 16 + key.len());
    out.extend_from_slice(prefix);
    out.extend_from_slice(&blake2_128_concat(key));
    out
}

/// Storage key of the `Credentials` entry for `id`.
pub fn credential_key(id: &CredentialId) -> Vec<u8> {
    map_key(&CREDENTIALS_PREFIX, id.as_bytes())
}

/// Storage key of the `OwnerCredentials` index for `owner`.
pub fn owner_credentials_key(owner: &AccountId) -> Result<Vec<u8>, CryptoError> {
    let address = decode_ss58(owner.as_str())?;
    Ok(map_key(&OWNER_CREDENTIALS_PREFIX, &address.public_key))
}

/// Decode an `OwnerCredentials` value.
pub fn decode_owner_index(bytes: &[u8]) -> Result<Vec<CredentialId>, ScaleError> {
    let mut reader = ScaleReader::new(bytes);
    let ids = reader.read_vec_array32()?;
    reader.finish()?;
    Ok(ids.into_iter().map(CredentialId::new).collect())
}

/// Decode a `Credentials` value, rendering the owner with `ss58_prefix`.
pub fn decode_credential_entry(
    bytes: &[u8],
    ss58_prefix: u16,
) -> Result<StoredCredential, ScaleError> {
    let mut reader = ScaleReader::new(bytes);
    let owner = reader.read_array32()?;
    let metadata = reader.read_vec()?;
    reader.finish()?;
    Ok(StoredCredential {
        owner: encode_ss58(&owner, ss58_prefix),
        metadata,
    })
}

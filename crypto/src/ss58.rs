//! SS58 address encoding.
//!
//! Address format: base58(prefix ++ public_key ++ checksum)
//!
//! Prefix: one byte for network ids below 64, two bytes for 64..16383.
//! Checksum: first 2 bytes of Blake2b-512("SS58PRE" ++ prefix ++ public_key).
//! Base58 alphabet: the Bitcoin alphabet (no 0, O, I or l).

use blake2::{Blake2b512, Digest};
use forge_types::AccountId;

use crate::CryptoError;

/// Network id of the generic Substrate address space.
pub const GENERIC_SS58_PREFIX: u16 = 42;

/// Base58 alphabet (58 chars).
const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Reverse lookup table: ASCII byte → base58 digit (0xFF = invalid).
const BASE58_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let alpha = BASE58_ALPHABET;
    let mut i = 0;
    while i < 58 {
        table[alpha[i] as usize] = i as u8;
        i += 1;
    }
    table
};

const CHECKSUM_PREFIX: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;
const PUBLIC_KEY_LEN: usize = 32;

/// A decoded SS58 address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ss58Address {
    pub prefix: u16,
    pub public_key: [u8; 32],
}

/// Encode bytes as base58. Leading zero bytes become leading `1`s.
fn encode_base58(bytes: &[u8]) -> String {
    let zeros = bytes.iter().take_while(|&&b| b == 0).count();
    // Base58 digits, least significant first.
    let mut digits: Vec<u8> = Vec::with_capacity(bytes.len() * 138 / 100 + 1);

    for &byte in &bytes[zeros..] {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut result = String::with_capacity(zeros + digits.len());
    for _ in 0..zeros {
        result.push('1');
    }
    for &digit in digits.iter().rev() {
        result.push(BASE58_ALPHABET[digit as usize] as char);
    }
    result
}

/// Decode a base58 string. Returns `None` on characters outside the alphabet.
fn decode_base58(s: &str) -> Option<Vec<u8>> {
    let zeros = s.bytes().take_while(|&c| c == b'1').count();
    // Base256 bytes, least significant first.
    let mut bytes: Vec<u8> = Vec::with_capacity(s.len());

    for c in s.bytes().skip(zeros) {
        if c >= 128 {
            return None;
        }
        let val = BASE58_DECODE[c as usize];
        if val == 0xFF {
            return None;
        }
        let mut carry = val as u32;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xFF) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xFF) as u8);
            carry >>= 8;
        }
    }

    let mut result = vec![0u8; zeros];
    result.extend(bytes.iter().rev());
    Some(result)
}

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Blake2b512::new();
    hasher.update(CHECKSUM_PREFIX);
    hasher.update(payload);
    let hash = hasher.finalize();
    [hash[0], hash[1]]
}

fn encode_prefix(prefix: u16) -> Vec<u8> {
    if prefix < 64 {
        vec![prefix as u8]
    } else {
        let first = (((prefix & 0b0000_0000_1111_1100) as u8) >> 2) | 0b0100_0000;
        let second = ((prefix >> 8) as u8) | (((prefix & 0b0000_0000_0000_0011) as u8) << 6);
        vec![first, second]
    }
}

/// Encode a public key as an SS58 address for the given network prefix.
///
/// Prefixes above 16383 are not representable and are masked to 14 bits.
pub fn encode_ss58(public_key: &[u8; 32], prefix: u16) -> AccountId {
    let mut payload = encode_prefix(prefix & 0x3FFF);
    payload.extend_from_slice(public_key);
    let sum = checksum(&payload);
    payload.extend_from_slice(&sum);
    AccountId::new(encode_base58(&payload))
}

/// Decode an SS58 address, verifying its checksum.
pub fn decode_ss58(address: &str) -> Result<Ss58Address, CryptoError> {
    let data = decode_base58(address).ok_or(CryptoError::InvalidBase58)?;
    let (prefix, prefix_len) = match data.first() {
        Some(&b) if b < 64 => (b as u16, 1),
        Some(&b) if b < 128 && data.len() > 1 => {
            let lower = (b << 2) | (data[1] >> 6);
            let upper = data[1] & 0b0011_1111;
            ((lower as u16) | ((upper as u16) << 8), 2)
        }
        Some(_) => return Err(CryptoError::UnsupportedPrefix),
        None => return Err(CryptoError::InvalidLength(0)),
    };

    if data.len() != prefix_len + PUBLIC_KEY_LEN + CHECKSUM_LEN {
        return Err(CryptoError::InvalidLength(data.len()));
    }

    let body_len = prefix_len + PUBLIC_KEY_LEN;
    if checksum(&data[..body_len]) != data[body_len..] {
        return Err(CryptoError::ChecksumMismatch);
    }

    let mut public_key = [0u8; 32];
    public_key.copy_from_slice(&data[prefix_len..body_len]);
    Ok(Ss58Address { prefix, public_key })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const ALICE_KEY: &str = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";

    fn alice_key() -> [u8; 32] {
        let mut key = [0u8; 32];
        hex::decode_to_slice(ALICE_KEY, &mut key).unwrap();
        key
    }

    #[test]
    fn decodes_well_known_dev_account() {
        let decoded = decode_ss58(ALICE).unwrap();
        assert_eq!(decoded.prefix, GENERIC_SS58_PREFIX);
        assert_eq!(decoded.public_key, alice_key());
    }

    #[test]
    fn encodes_well_known_dev_account() {
        assert_eq!(encode_ss58(&alice_key(), GENERIC_SS58_PREFIX).as_str(), ALICE);
    }

    #[test]
    fn two_byte_prefix_roundtrip() {
        let key = [9u8; 32];
        let address = encode_ss58(&key, 1284);
        let decoded = decode_ss58(address.as_str()).unwrap();
        assert_eq!(decoded.prefix, 1284);
        assert_eq!(decoded.public_key, key);
    }

    #[test]
    fn corrupted_address_fails_checksum() {
        let mut bad = ALICE.to_string();
        bad.pop();
        bad.push('Z');
        assert!(matches!(
            decode_ss58(&bad),
            Err(CryptoError::ChecksumMismatch) | Err(CryptoError::InvalidLength(_))
        ));
    }

    #[test]
    fn invalid_characters_rejected() {
        assert_eq!(decode_ss58("0OIl"), Err(CryptoError::InvalidBase58));
    }

    #[test]
    fn short_address_rejected() {
        assert!(matches!(decode_ss58("5Grw"), Err(CryptoError::InvalidLength(_))));
    }

    #[test]
    fn base58_preserves_leading_zeros() {
        let data = [0u8, 0, 1, 2, 3];
        let encoded = encode_base58(&data);
        assert!(encoded.starts_with("11"));
        assert_eq!(decode_base58(&encoded).unwrap(), data);
    }
}

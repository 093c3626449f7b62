//! In-flight submission guard.
//!
//! A dedup key is the Blake2b-256 digest of the operation kind, the account's
//! public key and the fields that identify the logical operation. Keying on
//! the public key makes one account match under any SS58 prefix. While a key is held,
//! a second submission with the same key is rejected, not queued.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use forge_crypto::blake2_256;
use forge_types::{CredentialId, CredentialMetadata};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DedupKey([u8; 32]);

impl DedupKey {
    fn from_parts(parts: &[&[u8]]) -> Self {
        let mut buf = Vec::new();
        for part in parts {
            buf.extend_from_slice(&(part.len() as u32).to_le_bytes());
            buf.extend_from_slice(part);
        }
        Self(blake2_256(&buf))
    }

    /// Mint: account, name and timestamp.
    pub fn mint(account: &[u8; 32], metadata: &CredentialMetadata) -> Self {
        let timestamp = metadata.timestamp.timestamp().to_le_bytes();
        Self::from_parts(&[
            &b"mint"[..],
            &account[..],
            metadata.name.as_bytes(),
            &timestamp[..],
        ])
    }

    pub fn update(account: &[u8; 32], id: &CredentialId) -> Self {
        Self::from_parts(&[&b"update"[..], &account[..], &id.as_bytes()[..]])
    }

    pub fn delete(account: &[u8; 32], id: &CredentialId) -> Self {
        Self::from_parts(&[&b"delete"[..], &account[..], &id.as_bytes()[..]])
    }
}

/// Keys of the submissions currently in flight.
#[derive(Clone, Default)]
pub struct InFlight {
    keys: Arc<Mutex<HashSet<DedupKey>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or `None` if it is already held.
    ///
    /// The claim is released when the guard drops, whichever way the
    /// submission settles.
    pub fn try_acquire(&self, key: DedupKey) -> Option<InFlightGuard> {
        let inserted = self
            .keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
        if !inserted {
            return None;
        }
        debug!(in_flight = self.len(), "submission claimed");
        Some(InFlightGuard {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    pub fn len(&self) -> usize {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[must_use = "the key is released as soon as the guard drops"]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<DedupKey>>>,
    key: DedupKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::account_key;
    use chrono::{TimeZone, Utc};
    use forge_types::{CredentialType, Visibility};

    fn meta(name: &str, secs: i64) -> CredentialMetadata {
        CredentialMetadata {
            credential_type: CredentialType::Skill,
            name: name.into(),
            description: String::new(),
            issuer: "Acme".into(),
            rating: None,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            visibility: Visibility::Public,
            proof_hash: None,
        }
    }

    const ALICE: [u8; 32] = [1; 32];
    const BOB: [u8; 32] = [2; 32];

    #[test]
    fn mint_key_depends_on_name_and_timestamp() {
        let alice = ALICE;
        let base = DedupKey::mint(&alice, &meta("Rust", 1_700_000_000));
        assert_eq!(base, DedupKey::mint(&alice, &meta("Rust", 1_700_000_000)));
        assert_ne!(base, DedupKey::mint(&alice, &meta("Go", 1_700_000_000)));
        assert_ne!(base, DedupKey::mint(&alice, &meta("Rust", 1_700_000_001)));
        assert_ne!(base, DedupKey::mint(&BOB, &meta("Rust", 1_700_000_000)));
    }

    #[test]
    fn operation_kind_separates_keys() {
        let alice = ALICE;
        let id = CredentialId::new([7; 32]);
        assert_ne!(DedupKey::update(&alice, &id), DedupKey::delete(&alice, &id));
    }

    #[test]
    fn one_account_under_two_prefixes_shares_a_key() {
        let generic = forge_crypto::encode_ss58(&ALICE, 42);
        let polkadot = forge_crypto::encode_ss58(&ALICE, 0);
        assert_ne!(generic, polkadot);

        let id = CredentialId::new([3; 32]);
        let a = DedupKey::update(&account_key(&generic).unwrap(), &id);
        let b = DedupKey::update(&account_key(&polkadot).unwrap(), &id);
        assert_eq!(a, b);
    }

    #[test]
    fn length_prefix_prevents_ambiguity() {
        let a = DedupKey::from_parts(&[&b"ab"[..], &b"c"[..]]);
        let b = DedupKey::from_parts(&[&b"a"[..], &b"bc"[..]]);
        assert_ne!(a, b);
    }

    #[test]
    fn second_claim_is_rejected_until_release() {
        let in_flight = InFlight::new();
        let key = DedupKey::delete(&ALICE, &CredentialId::new([1; 32]));

        let guard = in_flight.try_acquire(key).expect("first claim");
        assert!(in_flight.try_acquire(key).is_none());
        assert_eq!(in_flight.len(), 1);

        drop(guard);
        assert!(in_flight.is_empty());
        assert!(in_flight.try_acquire(key).is_some());
    }
}

//! Dispatch result inference.
//!
//! The transport does not decode runtime events. Once an extrinsic is
//! finalized, the credential's storage at the finalized block is compared
//! with its parent and the pallet's own checks are replayed to name the
//! module error when the expected change is missing.

use forge_crypto::{credential_id_for, decode_ss58};
use forge_protocol::pallet::{MAX_CREDENTIALS_PER_OWNER, MAX_METADATA_BYTES};
use forge_protocol::{
    ChainCall, ChainEvent, CredentialEvent, DispatchError, PalletError, StoredCredential,
};
use forge_types::{AccountId, CredentialId};

/// Credential storage on either side of the finalized block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageDiff {
    pub before: Option<StoredCredential>,
    pub after: Option<StoredCredential>,
    /// Size of the signer's owner index at the parent block.
    pub owned_before: usize,
}

/// The credential whose storage entry `call` touches.
pub fn touched_credential(call: &ChainCall) -> CredentialId {
    match call {
        ChainCall::Mint { metadata } => credential_id_for(metadata),
        ChainCall::Update { id, .. } | ChainCall::Delete { id } => *id,
    }
}

pub fn infer_events(call: &ChainCall, signer: &AccountId, diff: &StorageDiff) -> Vec<ChainEvent> {
    match dispatch_result(call, signer, diff) {
        Ok(event) => vec![ChainEvent::Credential(event), ChainEvent::ExtrinsicSuccess],
        Err(error) => vec![ChainEvent::ExtrinsicFailed(error)],
    }
}

fn dispatch_result(
    call: &ChainCall,
    signer: &AccountId,
    diff: &StorageDiff,
) -> Result<CredentialEvent, DispatchError> {
    let owner = signer.clone();
    match call {
        ChainCall::Mint { metadata } => {
            let id = credential_id_for(metadata);
            match (&diff.before, &diff.after) {
                (None, Some(after)) if same_account(&after.owner, signer) => {
                    Ok(CredentialEvent::Minted { id, owner })
                }
                _ if metadata.len() > MAX_METADATA_BYTES => {
                    Err(DispatchError::credentials(PalletError::MetadataTooLarge))
                }
                (Some(_), _) => Err(DispatchError::credentials(
                    PalletError::CredentialAlreadyExists,
                )),
                _ if diff.owned_before >= MAX_CREDENTIALS_PER_OWNER => {
                    Err(DispatchError::credentials(PalletError::TooManyCredentials))
                }
                _ => Err(unexplained()),
            }
        }
        ChainCall::Update { id, metadata } => match (&diff.before, &diff.after) {
            (None, _) => Err(DispatchError::credentials(PalletError::CredentialNotFound)),
            (Some(before), _) if !same_account(&before.owner, signer) => {
                Err(DispatchError::credentials(PalletError::NotCredentialOwner))
            }
            _ if metadata.len() > MAX_METADATA_BYTES => {
                Err(DispatchError::credentials(PalletError::MetadataTooLarge))
            }
            (Some(_), Some(after)) if &after.metadata == metadata => {
                Ok(CredentialEvent::Updated { id: *id, owner })
            }
            _ => Err(unexplained()),
        },
        ChainCall::Delete { id } => match (&diff.before, &diff.after) {
            (None, _) => Err(DispatchError::credentials(PalletError::CredentialNotFound)),
            (Some(before), _) if !same_account(&before.owner, signer) => {
                Err(DispatchError::credentials(PalletError::NotCredentialOwner))
            }
            (Some(_), None) => Ok(CredentialEvent::Deleted { id: *id, owner }),
            _ => Err(unexplained()),
        },
    }
}

fn unexplained() -> DispatchError {
    DispatchError::Other("extrinsic failed: credential storage unchanged at finality".into())
}

/// Compare by public key so differing SS58 prefixes still match.
fn same_account(a: &AccountId, b: &AccountId) -> bool {
    match (decode_ss58(a.as_str()), decode_ss58(b.as_str())) {
        (Ok(a), Ok(b)) => a.public_key == b.public_key,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_crypto::encode_ss58;

    fn account(seed: u8) -> AccountId {
        encode_ss58(&[seed; 32], 42)
    }

    fn stored(owner: &AccountId, metadata: &[u8]) -> StoredCredential {
        StoredCredential {
            owner: owner.clone(),
            metadata: metadata.to_vec(),
        }
    }

    fn module_error(events: &[ChainEvent]) -> Option<&str> {
        match events {
            [ChainEvent::ExtrinsicFailed(error)] => error.module_error(),
            _ => None,
        }
    }

    #[test]
    fn mint_that_created_the_entry_succeeded() {
        let alice = account(1);
        let metadata = b"{\"n\":\"Rust\"}".to_vec();
        let call = ChainCall::Mint {
            metadata: metadata.clone(),
        };
        let diff = StorageDiff {
            after: Some(stored(&alice, &metadata)),
            ..Default::default()
        };
        let events = infer_events(&call, &alice, &diff);
        assert_eq!(
            events[0],
            ChainEvent::Credential(CredentialEvent::Minted {
                id: credential_id_for(&metadata),
                owner: alice,
            })
        );
        assert_eq!(events[1], ChainEvent::ExtrinsicSuccess);
    }

    #[test]
    fn owner_matches_across_prefixes() {
        let kusama_style = encode_ss58(&[1; 32], 2);
        let metadata = b"x".to_vec();
        let diff = StorageDiff {
            after: Some(stored(&account(1), &metadata)),
            ..Default::default()
        };
        let events = infer_events(&ChainCall::Mint { metadata }, &kusama_style, &diff);
        assert_eq!(events.last(), Some(&ChainEvent::ExtrinsicSuccess));
    }

    #[test]
    fn mint_failures_name_the_module_error() {
        let alice = account(1);
        let existing = StorageDiff {
            before: Some(stored(&alice, b"x")),
            after: Some(stored(&alice, b"x")),
            owned_before: 1,
        };
        let call = ChainCall::Mint {
            metadata: b"x".to_vec(),
        };
        assert_eq!(
            module_error(&infer_events(&call, &alice, &existing)),
            Some("CredentialAlreadyExists")
        );

        let full = StorageDiff {
            owned_before: MAX_CREDENTIALS_PER_OWNER,
            ..Default::default()
        };
        assert_eq!(
            module_error(&infer_events(&call, &alice, &full)),
            Some("TooManyCredentials")
        );

        let huge = ChainCall::Mint {
            metadata: vec![b'a'; MAX_METADATA_BYTES + 1],
        };
        assert_eq!(
            module_error(&infer_events(&huge, &alice, &StorageDiff::default())),
            Some("MetadataTooLarge")
        );
    }

    #[test]
    fn update_by_someone_else() {
        let id = CredentialId::new([9; 32]);
        let diff = StorageDiff {
            before: Some(stored(&account(1), b"old")),
            after: Some(stored(&account(1), b"old")),
            owned_before: 0,
        };
        let call = ChainCall::Update {
            id,
            metadata: b"new".to_vec(),
        };
        assert_eq!(
            module_error(&infer_events(&call, &account(2), &diff)),
            Some("NotCredentialOwner")
        );
        assert_eq!(
            module_error(&infer_events(&call, &account(2), &StorageDiff::default())),
            Some("CredentialNotFound")
        );
    }

    #[test]
    fn applied_update_and_delete() {
        let alice = account(1);
        let id = CredentialId::new([9; 32]);
        let updated = StorageDiff {
            before: Some(stored(&alice, b"old")),
            after: Some(stored(&alice, b"new")),
            owned_before: 0,
        };
        let call = ChainCall::Update {
            id,
            metadata: b"new".to_vec(),
        };
        assert!(matches!(
            infer_events(&call, &alice, &updated)[0],
            ChainEvent::Credential(CredentialEvent::Updated { .. })
        ));

        let deleted = StorageDiff {
            before: Some(stored(&alice, b"old")),
            after: None,
            owned_before: 0,
        };
        assert!(matches!(
            infer_events(&ChainCall::Delete { id }, &alice, &deleted)[0],
            ChainEvent::Credential(CredentialEvent::Deleted { .. })
        ));
    }

    #[test]
    fn unchanged_storage_is_an_unexplained_failure() {
        let alice = account(1);
        let diff = StorageDiff {
            before: Some(stored(&alice, b"old")),
            after: Some(stored(&alice, b"old")),
            owned_before: 0,
        };
        let events = infer_events(
            &ChainCall::Delete {
                id: CredentialId::new([1; 32]),
            },
            &alice,
            &diff,
        );
        assert!(matches!(
            &events[..],
            [ChainEvent::ExtrinsicFailed(DispatchError::Other(_))]
        ));
    }
}

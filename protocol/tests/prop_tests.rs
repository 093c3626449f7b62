use forge_protocol::scale::{encode_compact, ScaleReader};
use forge_protocol::storage::{decode_credential_entry, decode_owner_index};
use forge_protocol::ChainCall;
use forge_types::CredentialId;
use proptest::prelude::*;

fn arb_call() -> impl Strategy<Value = ChainCall> {
    let metadata = prop::collection::vec(any::<u8>(), 0..600);
    prop_oneof![
        metadata.clone().prop_map(|metadata| ChainCall::Mint { metadata }),
        (any::<[u8; 32]>(), metadata).prop_map(|(id, metadata)| ChainCall::Update {
            id: CredentialId::new(id),
            metadata
        }),
        any::<[u8; 32]>().prop_map(|id| ChainCall::Delete {
            id: CredentialId::new(id)
        }),
    ]
}

proptest! {
    #[test]
    fn compact_round_trip(value in any::<u64>()) {
        let mut bytes = Vec::new();
        encode_compact(value, &mut bytes);
        let mut reader = ScaleReader::new(&bytes);
        prop_assert_eq!(reader.read_compact().unwrap(), value);
        prop_assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn call_round_trip(call in arb_call(), pallet in any::<u8>()) {
        let (decoded_pallet, decoded) = ChainCall::decode(&call.encode(pallet)).unwrap();
        prop_assert_eq!(decoded_pallet, pallet);
        prop_assert_eq!(decoded, call);
    }

    #[test]
    fn storage_decoders_never_panic(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_owner_index(&bytes);
        let _ = decode_credential_entry(&bytes, 42);
        let _ = ChainCall::decode(&bytes);
    }
}

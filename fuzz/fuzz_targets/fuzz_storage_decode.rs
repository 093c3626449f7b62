#![no_main]

use forge_protocol::storage::{decode_credential_entry, decode_owner_index};
use forge_protocol::ChainCall;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = decode_owner_index(data);
    let _ = decode_credential_entry(data, 42);

    // Re-encoding a decoded call yields the same call.
    if let Ok((pallet_index, call)) = ChainCall::decode(data) {
        let reencoded = call.encode(pallet_index);
        assert_eq!(ChainCall::decode(&reencoded), Ok((pallet_index, call)));
    }
});

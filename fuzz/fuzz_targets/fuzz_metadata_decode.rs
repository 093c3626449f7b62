#![no_main]

use chrono::{TimeZone, Utc};
use forge_metadata::{decode_metadata, RawPayload};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

    // Stored bytes straight from a node.
    if let Ok(decoded) = decode_metadata(data, now) {
        assert!(!decoded.metadata.name.is_empty());
        assert!(!decoded.metadata.issuer.is_empty());
    }

    // The same bytes as a hex or text payload.
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(bytes) = RawPayload::from(text).into_bytes() {
            let _ = decode_metadata(&bytes, now);
        }
    }
});

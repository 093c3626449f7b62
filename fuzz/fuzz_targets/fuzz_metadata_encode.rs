#![no_main]

use arbitrary::Arbitrary;
use forge_metadata::{Encoding, MetadataCodec};
use forge_types::CredentialDraft;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    credential_type: Option<String>,
    name: Option<String>,
    description: Option<String>,
    issuer: Option<String>,
    rating: Option<f64>,
    timestamp: Option<String>,
    visibility: Option<String>,
    proof_hash: Option<String>,
    limit: u16,
    full: bool,
}

fuzz_target!(|input: Input| {
    let encoding = if input.full { Encoding::Full } else { Encoding::Compact };
    let codec = MetadataCodec::new(input.limit as usize, encoding);
    let draft = CredentialDraft {
        credential_type: input.credential_type,
        name: input.name,
        description: input.description,
        issuer: input.issuer,
        rating: input.rating,
        timestamp: input.timestamp,
        visibility: input.visibility,
        proof_hash: input.proof_hash,
    };

    // Anything accepted fits the ceiling and reads back.
    if let Ok((metadata, bytes)) = codec.encode_draft(&draft) {
        assert!(bytes.len() <= codec.limit());
        let decoded = codec.decode(bytes).expect("encoded metadata decodes");
        assert_eq!(decoded.name, metadata.name);
        assert_eq!(decoded.issuer, metadata.issuer);
        assert_eq!(decoded.credential_type, metadata.credential_type);
        assert_eq!(decoded.timestamp, metadata.timestamp);
    }
});

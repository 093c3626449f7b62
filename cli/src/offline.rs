//! Commands that never touch the network.

use anyhow::Context;
use chrono::Utc;
use forge_crypto::credential_id_for;
use forge_metadata::{decode_metadata, MetadataCodec, RawPayload};
use forge_types::{CredentialDraft, CredentialId, CredentialMetadata};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DecodeReport {
    pub format: &'static str,
    pub size: usize,
    pub metadata: CredentialMetadata,
}

/// Decode `input` as `0x`-hex or as the stored text itself.
pub fn decode(input: &str) -> anyhow::Result<DecodeReport> {
    let bytes = RawPayload::from(input).into_bytes()?;
    let decoded = decode_metadata(&bytes, Utc::now())?;
    Ok(DecodeReport {
        format: decoded.format.as_str(),
        size: bytes.len(),
        metadata: decoded.metadata,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeReport {
    pub encoding: String,
    pub size: usize,
    pub limit: usize,
    /// The id the chain will assign on mint.
    pub credential_id: CredentialId,
    pub hex: String,
    pub metadata: CredentialMetadata,
}

/// Validate a JSON draft and encode it as a mint would.
pub fn encode(codec: &MetadataCodec, draft_json: &str) -> anyhow::Result<EncodeReport> {
    let draft: CredentialDraft =
        serde_json::from_str(draft_json).context("draft is not a JSON credential object")?;
    let (metadata, bytes) = codec.encode_draft(&draft)?;
    Ok(EncodeReport {
        encoding: codec.encoding().to_string(),
        size: bytes.len(),
        limit: codec.limit(),
        credential_id: credential_id_for(&bytes),
        hex: format!("0x{}", hex::encode(&bytes)),
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_types::CredentialType;

    const DRAFT: &str = r#"{
        "type": "skill",
        "name": "Rust",
        "description": "Systems programming",
        "issuer": "Ferrous",
        "timestamp": "2024-06-01T12:00:00Z",
        "visibility": "public"
    }"#;

    #[test]
    fn decodes_hex_and_text() {
        let text = r#"{"t":"s","n":"Rust","i":"Ferrous","ts":1717243200,"v":1}"#;
        let from_text = decode(text).unwrap();
        assert_eq!(from_text.format, "compact");
        assert_eq!(from_text.metadata.name, "Rust");

        let from_hex = decode(&format!("0x{}", hex::encode(text))).unwrap();
        assert_eq!(from_hex.metadata, from_text.metadata);
        assert_eq!(from_hex.size, text.len());

        assert_eq!(decode("r|Logo|Acme|1706745600|1").unwrap().format, "pipe");
    }

    #[test]
    fn undecodable_input_is_an_error() {
        assert!(decode("0xzz").is_err());
        assert!(decode("{broken").is_err());
    }

    #[test]
    fn encode_reports_size_and_id() {
        let report = encode(&MetadataCodec::default(), DRAFT).unwrap();
        assert_eq!(report.metadata.credential_type, CredentialType::Skill);
        assert_eq!(report.limit, 3072);
        let bytes = hex::decode(report.hex.trim_start_matches("0x")).unwrap();
        assert_eq!(bytes.len(), report.size);
        assert_eq!(report.credential_id, credential_id_for(&bytes));
    }

    #[test]
    fn encode_rejects_oversized_drafts() {
        let mut draft: serde_json::Value = serde_json::from_str(DRAFT).unwrap();
        draft["description"] = "a".repeat(4000).into();
        let err = encode(&MetadataCodec::default(), &draft.to_string()).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }
}

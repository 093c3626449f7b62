use chrono::{DateTime, Utc};
use forge_types::{CredentialDraft, CredentialMetadata};
use tracing::debug;

use crate::{
    decode_metadata, encode_metadata, validate_draft, CodecError, Encoding, RawPayload,
    CHAIN_METADATA_LIMIT, DEFAULT_METADATA_LIMIT,
};

/// Encodes metadata under a byte ceiling and decodes any stored layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetadataCodec {
    limit: usize,
    encoding: Encoding,
}

impl Default for MetadataCodec {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_LIMIT, Encoding::default())
    }
}

impl MetadataCodec {
    /// `limit` is clamped to what the pallet accepts.
    pub fn new(limit: usize, encoding: Encoding) -> Self {
        Self {
            limit: limit.min(CHAIN_METADATA_LIMIT),
            encoding,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Validate and serialize. Payloads over the limit are rejected whole.
    pub fn encode(&self, metadata: &CredentialMetadata) -> Result<Vec<u8>, CodecError> {
        let bytes = encode_metadata(metadata, self.encoding)?;
        if bytes.len() > self.limit {
            return Err(CodecError::MetadataTooLarge {
                size: bytes.len(),
                limit: self.limit,
            });
        }
        debug!(
            size = bytes.len(),
            encoding = %self.encoding,
            "encoded credential metadata"
        );
        Ok(bytes)
    }

    /// Validate a draft, then encode it.
    pub fn encode_draft(
        &self,
        draft: &CredentialDraft,
    ) -> Result<(CredentialMetadata, Vec<u8>), CodecError> {
        let metadata = validate_draft(draft)?;
        let bytes = self.encode(&metadata)?;
        Ok((metadata, bytes))
    }

    /// Decode stored metadata, substituting the current time for bad timestamps.
    pub fn decode(&self, raw: impl Into<RawPayload>) -> Result<CredentialMetadata, CodecError> {
        self.decode_at(raw, Utc::now())
    }

    /// Decode stored metadata with an explicit stand-in for bad timestamps.
    pub fn decode_at(
        &self,
        raw: impl Into<RawPayload>,
        now: DateTime<Utc>,
    ) -> Result<CredentialMetadata, CodecError> {
        let bytes = raw.into().into_bytes()?;
        let decoded = decode_metadata(&bytes, now)?;
        debug!(format = %decoded.format, size = bytes.len(), "decoded credential metadata");
        Ok(decoded.metadata)
    }
}

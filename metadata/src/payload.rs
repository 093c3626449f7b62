//! Raw metadata as it arrives from storage or the command line.

use crate::CodecError;

/// Stored metadata in whichever form the caller holds it.
///
/// Nodes hand back SCALE `Vec<u8>` contents, while JSON-RPC callers and the
/// CLI usually hold a `0x`-prefixed hex string. Both reduce to the same
/// bytes before decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawPayload {
    Bytes(Vec<u8>),
    Text(String),
}

impl RawPayload {
    /// Resolve to raw bytes, hex-decoding `0x`-prefixed input.
    pub fn into_bytes(self) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Text(text) => match text.trim().strip_prefix("0x") {
                Some(digits) => decode_hex(digits),
                None => Ok(text.into_bytes()),
            },
            Self::Bytes(bytes) => match bytes.strip_prefix(b"0x") {
                // Some gateways return the hex text itself as the byte payload.
                Some(digits) if !digits.is_empty() && digits.iter().all(u8::is_ascii_hexdigit) => {
                    decode_hex(digits)
                }
                _ => Ok(bytes),
            },
        }
    }
}

fn decode_hex(digits: impl AsRef<[u8]>) -> Result<Vec<u8>, CodecError> {
    hex::decode(digits).map_err(|e| CodecError::InvalidHex(e.to_string()))
}

impl From<Vec<u8>> for RawPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for RawPayload {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<String> for RawPayload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawPayload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

//! Credentials pallet calls.

use forge_types::CredentialId;
use std::fmt;

use crate::pallet::{CALL_DELETE_CREDENTIAL, CALL_MINT_CREDENTIAL, CALL_UPDATE_CREDENTIAL};
use crate::scale::{encode_bytes, ScaleReader};
use crate::ScaleError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainCall {
    Mint { metadata: Vec<u8> },
    Update { id: CredentialId, metadata: Vec<u8> },
    Delete { id: CredentialId },
}

impl ChainCall {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }

    pub fn call_index(&self) -> u8 {
        match self {
            Self::Mint { .. } => CALL_MINT_CREDENTIAL,
            Self::Update { .. } => CALL_UPDATE_CREDENTIAL,
            Self::Delete { .. } => CALL_DELETE_CREDENTIAL,
        }
    }

    /// The credential this call targets, if it names one.
    pub fn target(&self) -> Option<CredentialId> {
        match self {
            Self::Mint { .. } => None,
            Self::Update { id, .. } | Self::Delete { id } => Some(*id),
        }
    }

    /// SCALE call data: `[pallet_index, call_index] ++ args`.
    pub fn encode(&self, pallet_index: u8) -> Vec<u8> {
        let mut out = vec![pallet_index, self.call_index()];
        match self {
            Self::Mint { metadata } => encode_bytes(metadata, &mut out),
            Self::Update { id, metadata } => {
                out.extend_from_slice(id.as_bytes());
                encode_bytes(metadata, &mut out);
            }
            Self::Delete { id } => out.extend_from_slice(id.as_bytes()),
        }
        out
    }

    /// Parse call data, returning the pallet index alongside the call.
    pub fn decode(bytes: &[u8]) -> Result<(u8, Self), ScaleError> {
        let mut reader = ScaleReader::new(bytes);
        let pallet_index = reader.read_u8()?;
        let call = match reader.read_u8()? {
            CALL_MINT_CREDENTIAL => Self::Mint {
                metadata: reader.read_vec()?,
            },
            CALL_UPDATE_CREDENTIAL => Self::Update {
                id: CredentialId::new(reader.read_array32()?),
                metadata: reader.read_vec()?,
            },
            CALL_DELETE_CREDENTIAL => Self::Delete {
                id: CredentialId::new(reader.read_array32()?),
            },
            index => return Err(ScaleError::UnknownIndex { kind: "call", index }),
        };
        reader.finish()?;
        Ok((pallet_index, call))
    }
}

impl fmt::Display for ChainCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            Some(id) => write!(f, "{}({})", self.kind(), id),
            None => f.write_str(self.kind()),
        }
    }
}

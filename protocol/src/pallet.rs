//! Constants of the `FreelanceCredentials` pallet.

use std::fmt;

pub const PALLET_NAME: &str = "FreelanceCredentials";

/// Position of the pallet in the reference runtime's `construct_runtime!`.
pub const DEFAULT_PALLET_INDEX: u8 = 8;

/// `BoundedVec<u8, ConstU32<4096>>` metadata bound.
pub const MAX_METADATA_BYTES: usize = 4096;

/// `BoundedVec<H256, ConstU32<500>>` per-owner index bound.
pub const MAX_CREDENTIALS_PER_OWNER: usize = 500;

pub const CALL_MINT_CREDENTIAL: u8 = 0;
pub const CALL_UPDATE_CREDENTIAL: u8 = 1;
pub const CALL_DELETE_CREDENTIAL: u8 = 2;

pub const EVENT_CREDENTIAL_MINTED: u8 = 0;
pub const EVENT_CREDENTIAL_UPDATED: u8 = 1;
pub const EVENT_CREDENTIAL_DELETED: u8 = 2;

/// Module errors, in declaration (and therefore index) order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PalletError {
    CredentialAlreadyExists,
    MetadataTooLarge,
    TooManyCredentials,
    CredentialNotFound,
    NotCredentialOwner,
}

impl PalletError {
    pub const ALL: [PalletError; 5] = [
        PalletError::CredentialAlreadyExists,
        PalletError::MetadataTooLarge,
        PalletError::TooManyCredentials,
        PalletError::CredentialNotFound,
        PalletError::NotCredentialOwner,
    ];

    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CredentialAlreadyExists => "CredentialAlreadyExists",
            Self::MetadataTooLarge => "MetadataTooLarge",
            Self::TooManyCredentials => "TooManyCredentials",
            Self::CredentialNotFound => "CredentialNotFound",
            Self::NotCredentialOwner => "NotCredentialOwner",
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }
}

impl fmt::Display for PalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

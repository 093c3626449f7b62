//! Credential metadata codec.
//!
//! Converts [`CredentialMetadata`](forge_types::CredentialMetadata) to the
//! bytes stored by the credentials pallet and back again. Three historical
//! encodings are readable:
//!
//! 1. pipe-delimited `type|name|issuer|reduced_ts|visibility_flag` (read only)
//! 2. field-coded compact JSON (`t`, `n`, `d`, `i`, `ts`, `v`, `r`, `p`)
//! 3. full JSON with long field names
//!
//! New writes use compact or full JSON and are rejected, never truncated,
//! when they exceed the configured byte ceiling.

pub mod codec;
pub mod decode;
pub mod encode;
pub mod error;
pub mod payload;
pub mod timestamp;
pub mod validate;

pub use codec::MetadataCodec;
pub use decode::{decode_metadata, Decoded, Format};
pub use encode::{encode_metadata, Encoding};
pub use error::CodecError;
pub use payload::RawPayload;
pub use validate::{validate_draft, validate_metadata};

/// Hard ceiling enforced by the pallet (`BoundedVec<u8, ConstU32<4096>>`).
pub const CHAIN_METADATA_LIMIT: usize = 4096;

/// Default client-side ceiling, leaving headroom below the chain's limit.
pub const DEFAULT_METADATA_LIMIT: usize = 3072;

/// Placeholder for a stored credential without a name.
pub const UNNAMED_CREDENTIAL: &str = "Unnamed Credential";

/// Placeholder for a stored credential without an issuer.
pub const UNKNOWN_ISSUER: &str = "Unknown Issuer";

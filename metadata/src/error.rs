use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("metadata too large: {size} bytes exceeds the {limit}-byte limit")]
    MetadataTooLarge { size: usize, limit: usize },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("malformed metadata: {0}")]
    Malformed(String),

    #[error("invalid hex payload: {0}")]
    InvalidHex(String),

    #[error("serialization failed: {0}")]
    Serialization(String),
}

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid base58 character in address")]
    InvalidBase58,

    #[error("invalid SS58 address length: {0} bytes")]
    InvalidLength(usize),

    #[error("unsupported SS58 prefix encoding")]
    UnsupportedPrefix,

    #[error("SS58 checksum mismatch")]
    ChecksumMismatch,
}

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScaleError {
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("invalid compact integer")]
    InvalidCompact,

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    #[error("unknown {kind} index {index}")]
    UnknownIndex { kind: &'static str, index: u8 },
}

/// Failures reported by a wallet signer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    /// The user declined to sign.
    #[error("signing rejected: {0}")]
    Rejected(String),

    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the chain transport layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("connection closed")]
    Closed,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error("submission failed: {0}")]
    Submit(String),
}

impl From<ScaleError> for TransportError {
    fn from(e: ScaleError) -> Self {
        Self::Decode(e.to_string())
    }
}

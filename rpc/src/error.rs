//! RPC error types.

use forge_protocol::TransportError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("websocket connect to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("{method} timed out")]
    Timeout { method: String },

    #[error("node returned error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("connection closed")]
    Closed,

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<RpcError> for TransportError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::Connect { .. } => TransportError::Connect(e.to_string()),
            RpcError::Timeout { .. } => TransportError::Timeout(e.to_string()),
            RpcError::Node { code, message } => TransportError::Rpc { code, message },
            RpcError::Closed => TransportError::Closed,
            RpcError::Malformed(reason) => TransportError::Decode(reason),
        }
    }
}

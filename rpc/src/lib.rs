//! WebSocket JSON-RPC transport for the FreelanceForge client.
//!
//! Implements [`forge_protocol::ChainTransport`] against a Substrate node:
//! - storage reads via `state_getStorage`
//! - signed submission via `author_submitAndWatchExtrinsic`
//! - finalized outcomes inferred from credential storage either side of the
//!   finalized block

pub mod client;
pub mod error;
pub mod inference;
pub mod transport;
pub mod watch;

pub use client::{RpcClient, Subscription};
pub use error::RpcError;
pub use transport::{WsHandle, WsTransport};

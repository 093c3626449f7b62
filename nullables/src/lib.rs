//! Nullable infrastructure for deterministic testing.
//!
//! The client reaches the outside world through three seams: a chain
//! transport, a live chain connection, and a wallet signer. This crate
//! provides test-friendly implementations of each that:
//! - Apply the credentials pallet rules to an in-memory state
//! - Can be controlled programmatically (refuse connections, fail reads,
//!   reject signatures, hold finalization)
//! - Never touch the network
//!
//! Usage: build a [`NullChain`], wrap it in a [`NullTransport`], and hand
//! that to the client in place of the WebSocket transport.

pub mod chain;
pub mod signer;
pub mod transport;

pub use chain::{dev_account, NullChain};
pub use signer::NullSigner;
pub use transport::{EndpointBehavior, NullHandle, NullTransport};

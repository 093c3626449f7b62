//! Credentials pallet protocol.
//!
//! Everything the client needs to know about the chain side: call and error
//! indices, storage key derivation, the subset of SCALE used by the pallet,
//! signed extrinsic assembly, and the [`ChainTransport`]/[`ChainHandle`]
//! traits that real and test transports implement.

pub mod call;
pub mod error;
pub mod extrinsic;
pub mod pallet;
pub mod scale;
pub mod status;
pub mod storage;
pub mod traits;

pub use call::ChainCall;
pub use error::{ScaleError, SignerError, TransportError};
pub use extrinsic::{build_signed_extrinsic, MultiSignature, SignatureScheme, SignerPayload};
pub use pallet::{PalletError, DEFAULT_PALLET_INDEX, PALLET_NAME};
pub use status::{ChainEvent, CredentialEvent, DispatchError, Submission, TxStatus};
pub use storage::StoredCredential;
pub use traits::{ChainHandle, ChainInfo, ChainTransport, WalletSigner};

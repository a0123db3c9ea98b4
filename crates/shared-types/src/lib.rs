//! # Shared Types Crate
//!
//! The ledger data model shared by every subsystem.
//!
//! ## Contents
//!
//! | Module | Types |
//! |--------|-------|
//! | `hash` | `Hash`, `AssetId` |
//! | `codec` | CompactSize varints, `Sink`, `Reader`, `EncodeMode` |
//! | `tx` | `Outpoint`, `TxInput`, `TxOutput`, `TxData`, `Tx`, `AssetAmount` |
//! | `block` | `BlockHeader`, `Block` |
//! | `sighash` | `SigHashType`, `SigHashCache` |
//! | `script` | pushdata parsing, multisig and pay-to-contract programs |
//!
//! ## Dual-Mode Encoding
//!
//! Every structure has two serializations:
//!
//! - **Wire** (`EncodeMode::Wire`): full bytes, used for storage and transport.
//! - **Hashing** (`EncodeMode::Hashing`): signature scripts, metadata and asset
//!   definitions are replaced by their double-SHA256. Transaction and block
//!   hashes are computed over this form, so signature data can be pruned
//!   from storage without changing any historical hash.

pub mod block;
pub mod codec;
pub mod errors;
pub mod hash;
pub mod script;
pub mod sighash;
pub mod tx;

pub use block::{Block, BlockHeader};
pub use codec::{EncodeMode, Reader, Sink};
pub use errors::{DecodeError, ScriptError};
pub use hash::{double_hash, AssetId, Hash};
pub use sighash::{SigHashCache, SigHashType};
pub use tx::{AssetAmount, Outpoint, Tx, TxData, TxInput, TxOutput, INVALID_OUTPUT_INDEX};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

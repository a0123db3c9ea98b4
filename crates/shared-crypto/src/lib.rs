//! # Shared Crypto - Ledger Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256, double SHA-256 | Transaction/block IDs, Merkle and patricia nodes |
//! | `ecdsa` | secp256k1 | Input signatures, block signatures |
//!
//! ## Security Properties
//!
//! - **secp256k1**: RFC 6979 deterministic nonces, low-S normalization
//! - **Signatures are over 32-byte digests**: callers hash first, then sign
//!   the digest without re-hashing it (prehash signing)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
pub use errors::CryptoError;
pub use hashing::{sha256, sha256d, DoubleSha256};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

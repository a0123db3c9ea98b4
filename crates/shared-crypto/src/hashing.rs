//! # SHA-256 Hashing
//!
//! Every identifier in the ledger (transaction hashes, block hashes, asset
//! IDs, Merkle and patricia node hashes) is a double SHA-256 digest.

use sha2::{Digest, Sha256};

/// Compute SHA-256 hash of data.
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Compute double SHA-256 hash (Bitcoin-style).
#[inline]
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Streaming double SHA-256.
///
/// Lets encoders write a serialization straight into the hasher instead of
/// materializing it first.
#[derive(Clone, Default)]
pub struct DoubleSha256 {
    inner: Sha256,
}

impl DoubleSha256 {
    /// Create new hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return `SHA256(SHA256(data))`.
    pub fn finalize(self) -> [u8; 32] {
        let first: [u8; 32] = self.inner.finalize().into();
        sha256(&first)
    }
}

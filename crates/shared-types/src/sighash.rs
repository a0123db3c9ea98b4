//! # Signature Hashes
//!
//! Per-input digests following Bitcoin's sighash modes. The preimage is:
//!
//! ```text
//! version ++ hash_prevouts ++ input.previous ++ prev asset_id ++ prev amount
//!   ++ hashed(input.metadata) ++ hash_outputs ++ lock_time
//!   ++ hashed(tx.metadata) ++ sighash_type
//! ```
//!
//! `SigHashCache` memoizes the two transaction-wide intermediates
//! (`hash_prevouts` and the all-outputs hash). Anything that depends on the
//! input index is recomputed on every call.

use crate::codec::{write_prunable, EncodeMode, Sink};
use crate::hash::Hash;
use crate::tx::{AssetAmount, TxData};
use serde::{Deserialize, Serialize};
use shared_crypto::DoubleSha256;
use std::cell::OnceCell;

/// Sighash selector byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SigHashType(u8);

impl SigHashType {
    /// Commit to every output.
    pub const ALL: SigHashType = SigHashType(0x01);
    /// Commit to no outputs.
    pub const NONE: SigHashType = SigHashType(0x02);
    /// Commit to the output at the input's own index.
    pub const SINGLE: SigHashType = SigHashType(0x03);

    const ANYONE_CAN_PAY: u8 = 0x80;
    const BASE_MASK: u8 = 0x1f;

    /// Parse a sighash byte; only base types 1..=3 (optionally with
    /// `ANYONECANPAY`) are accepted.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte & !Self::ANYONE_CAN_PAY {
            0x01..=0x03 => Some(Self(byte)),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        self.0
    }

    /// Same base type with `ANYONECANPAY` set.
    pub fn any_one_can_pay(self) -> Self {
        Self(self.0 | Self::ANYONE_CAN_PAY)
    }

    pub fn is_any_one_can_pay(self) -> bool {
        self.0 & Self::ANYONE_CAN_PAY != 0
    }

    fn base(self) -> u8 {
        self.0 & Self::BASE_MASK
    }
}

impl Default for SigHashType {
    fn default() -> Self {
        Self::ALL
    }
}

/// Shared intermediate hashes for every input of one transaction.
///
/// Tied to the transaction by lifetime, so a cache can never be reused
/// across transactions.
pub struct SigHashCache<'a> {
    tx: &'a TxData,
    prevouts: OnceCell<Hash>,
    outputs: OnceCell<Hash>,
}

impl<'a> SigHashCache<'a> {
    pub fn new(tx: &'a TxData) -> Self {
        Self {
            tx,
            prevouts: OnceCell::new(),
            outputs: OnceCell::new(),
        }
    }

    fn hash_prevouts(&self) -> Hash {
        *self.prevouts.get_or_init(|| {
            let mut h = DoubleSha256::new();
            for input in &self.tx.inputs {
                input.previous.encode(&mut h);
            }
            Hash(h.finalize())
        })
    }

    fn hash_all_outputs(&self) -> Hash {
        *self.outputs.get_or_init(|| {
            let mut h = DoubleSha256::new();
            for output in &self.tx.outputs {
                output.encode(&mut h, EncodeMode::Hashing);
            }
            Hash(h.finalize())
        })
    }

    fn hash_single_output(&self, index: usize) -> Hash {
        match self.tx.outputs.get(index) {
            Some(output) => {
                let mut h = DoubleSha256::new();
                output.encode(&mut h, EncodeMode::Hashing);
                Hash(h.finalize())
            }
            None => Hash::ZERO,
        }
    }

    /// Signature hash for input `index` spending `prev` under `sighash`.
    ///
    /// Returns `None` if `index` is out of range.
    pub fn hash(&self, index: usize, prev: AssetAmount, sighash: SigHashType) -> Option<Hash> {
        let input = self.tx.inputs.get(index)?;

        let prevouts = if sighash.is_any_one_can_pay() {
            Hash::ZERO
        } else {
            self.hash_prevouts()
        };
        let outputs = match sighash.base() {
            0x01 => self.hash_all_outputs(),
            0x03 => self.hash_single_output(index),
            _ => Hash::ZERO,
        };

        let mut h = DoubleSha256::new();
        h.put(&self.tx.version.to_le_bytes());
        h.put(prevouts.as_bytes());
        input.previous.encode(&mut h);
        h.put(prev.asset_id.as_bytes());
        h.put(&prev.amount.to_le_bytes());
        write_prunable(&mut h, &input.metadata, EncodeMode::Hashing);
        h.put(outputs.as_bytes());
        h.put(&self.tx.lock_time.to_le_bytes());
        write_prunable(&mut h, &self.tx.metadata, EncodeMode::Hashing);
        h.put(&[sighash.to_byte()]);
        Some(Hash(h.finalize()))
    }
}

impl TxData {
    /// Signature hash for one input without a shared cache.
    pub fn hash_for_sig(
        &self,
        index: usize,
        prev: AssetAmount,
        sighash: SigHashType,
    ) -> Option<Hash> {
        SigHashCache::new(self).hash(index, prev, sighash)
    }
}

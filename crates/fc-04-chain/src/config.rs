//! Configuration types for the chain controller

use crate::error::{ChainError, Result};
use serde::Deserialize;
use shared_crypto::Secp256k1PublicKey;

/// Runtime configuration for the chain controller
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Cap on pool transactions considered per generated block
    pub max_block_txs: usize,

    /// Hex compressed public keys whose block signatures vouch for the
    /// block's transaction predicates
    pub trusted_signers: Vec<String>,

    /// Version written into generated block headers
    pub block_version: u32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_block_txs: crate::DEFAULT_MAX_BLOCK_TXS,
            trusted_signers: Vec::new(),
            block_version: shared_types::BlockHeader::CURRENT_VERSION,
        }
    }
}

impl ChainConfig {
    /// Parse `trusted_signers`.
    pub fn trusted_keys(&self) -> Result<Vec<Secp256k1PublicKey>> {
        self.trusted_signers
            .iter()
            .map(|hex| {
                Secp256k1PublicKey::from_hex(hex)
                    .map_err(|e| ChainError::InvalidConfig(format!("trusted signer {hex}: {e}")))
            })
            .collect()
    }

    /// Reject unusable settings.
    pub fn validate(&self) -> Result<()> {
        if self.max_block_txs == 0 {
            return Err(ChainError::InvalidConfig(
                "max_block_txs must be positive".into(),
            ));
        }
        self.trusted_keys().map(|_| ())
    }
}

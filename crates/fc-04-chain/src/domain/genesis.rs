//! Genesis block construction

use crate::error::{ChainError, Result};
use fc_02_state::StateTree;
use shared_crypto::Secp256k1PublicKey;
use shared_types::script::MultisigProgram;
use shared_types::{Block, BlockHeader, Hash, Timestamp};

/// Height of the first block.
pub const GENESIS_HEIGHT: u64 = 1;

/// Build the genesis block: no transactions, empty state, and an output
/// script requiring `signatures_required` of `signers` on the next block.
pub fn genesis_block(
    signers: &[Secp256k1PublicKey],
    signatures_required: usize,
    timestamp: Timestamp,
) -> Result<Block> {
    let output_script = MultisigProgram::new(signatures_required, signers.to_vec())
        .to_program()
        .ok_or_else(|| {
            ChainError::InvalidConfig(format!(
                "cannot require {signatures_required} of {} block signers",
                signers.len()
            ))
        })?;

    Ok(Block {
        header: BlockHeader {
            version: BlockHeader::CURRENT_VERSION,
            height: GENESIS_HEIGHT,
            previous_block_hash: Hash::ZERO,
            tx_root: Hash::ZERO,
            state_root: StateTree::new().root_hash(),
            timestamp,
            signature_script: Vec::new(),
            output_script,
        },
        transactions: Vec::new(),
    })
}

//! Persistence port

use crate::error::StoreError;
use async_trait::async_trait;
use fc_02_state::{AssetDefinitionPointer, Output, StateTree, ViewReader};
use shared_types::{AssetId, Block, Hash, Tx};
use std::collections::BTreeMap;

/// Where a known transaction currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    /// Admitted to the pending pool
    Pool,
    /// Included in an applied block
    Confirmed,
}

/// Block, confirmed state and pending pool storage.
///
/// Implementations must make `apply_tx`, `remove_txs` and `apply_block`
/// each atomic with respect to the readers.
///
/// The "prevouts" of a batch of transactions are the outpoints its inputs
/// spend plus, for issuance transactions, the outpoints the transaction
/// itself would create. Views returned for them may contain extra records.
#[async_trait]
pub trait Store: Send + Sync {
    /// Add a validated transaction to the pending pool.
    async fn apply_tx(&self, tx: &Tx) -> Result<(), StoreError>;

    /// Drop confirmed and conflicting transactions from the pool.
    async fn remove_txs(&self, confirmed: &[Tx], conflicting: &[Tx]) -> Result<(), StoreError>;

    /// Pending transactions in admission order.
    async fn pool_txs(&self) -> Result<Vec<Tx>, StoreError>;

    /// Outputs created or spent by the pending pool that `txs` reference.
    async fn new_pool_view_for_prevouts(&self, txs: &[Tx])
        -> Result<Box<dyn ViewReader>, StoreError>;

    /// Confirmed outputs that `txs` reference, plus asset definition pointers.
    async fn new_view_for_prevouts(&self, txs: &[Tx]) -> Result<Box<dyn ViewReader>, StoreError>;

    /// Persist a validated block and its effects.
    ///
    /// Spent outputs in `outputs` are deleted. Returns the block's
    /// transactions that were not in the pending pool.
    async fn apply_block(
        &self,
        block: &Block,
        pointers: &BTreeMap<AssetId, AssetDefinitionPointer>,
        outputs: &[Output],
        state: StateTree,
    ) -> Result<Vec<Tx>, StoreError>;

    /// Highest applied block.
    async fn latest_block(&self) -> Result<Option<Block>, StoreError>;

    async fn block_by_height(&self, height: u64) -> Result<Option<Block>, StoreError>;

    async fn tx_status(&self, hash: &Hash) -> Result<Option<TxStatus>, StoreError>;

    /// State commitment as of the latest block.
    async fn state_tree(&self) -> Result<StateTree, StoreError>;
}

//! In-memory `Store`

use crate::domain::pool::{hash_set, referenced_outpoints};
use crate::error::StoreError;
use crate::ports::{Store, TxStatus};
use async_trait::async_trait;
use fc_02_state::{AssetDefinitionPointer, MemView, Output, StateTree, ViewReader, ViewWriter};
use parking_lot::RwLock;
use shared_types::{AssetId, Block, Hash, Outpoint, Tx};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Default)]
struct Inner {
    blocks: Vec<Block>,
    outputs: HashMap<Outpoint, Output>,
    pointers: BTreeMap<AssetId, AssetDefinitionPointer>,
    confirmed: HashSet<Hash>,
    state: StateTree,
    pool: Vec<Tx>,
    pool_hashes: HashSet<Hash>,
    /// Outputs created by pool transactions and spent markers for what
    /// they consume.
    pool_view: MemView,
}

impl Inner {
    fn apply_pool_tx(&mut self, tx: &Tx) {
        for input in tx.inputs.iter().filter(|i| !i.is_issuance()) {
            let prev = self
                .pool_view
                .output(&input.previous)
                .or_else(|| self.outputs.get(&input.previous).cloned());
            if let Some(prev) = prev {
                self.pool_view.save_output(prev.into_spent());
            }
        }
        for (index, output) in tx.outputs.iter().enumerate() {
            self.pool_view
                .save_output(Output::new(tx.outpoint(index as u32), output.clone()));
        }
    }

    fn rebuild_pool_view(&mut self) {
        self.pool_view = MemView::new();
        let pool = std::mem::take(&mut self.pool);
        for tx in &pool {
            self.apply_pool_tx(tx);
        }
        self.pool = pool;
    }
}

/// Store holding everything in process memory.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending transactions.
    pub fn pool_len(&self) -> usize {
        self.inner.read().pool.len()
    }

    /// Confirmed unspent output at `outpoint`.
    pub fn output(&self, outpoint: &Outpoint) -> Option<Output> {
        self.inner.read().outputs.get(outpoint).cloned()
    }

    /// All confirmed unspent outputs.
    pub fn unspent_outputs(&self) -> Vec<Output> {
        let mut outputs: Vec<_> = self.inner.read().outputs.values().cloned().collect();
        outputs.sort_by_key(|o| o.outpoint);
        outputs
    }
}

#[async_trait]
impl Store for MemStore {
    async fn apply_tx(&self, tx: &Tx) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let hash = tx.hash();
        if inner.confirmed.contains(&hash) || !inner.pool_hashes.insert(hash) {
            return Err(StoreError::Conflict(format!("transaction {hash} already stored")));
        }
        inner.apply_pool_tx(tx);
        inner.pool.push(tx.clone());
        Ok(())
    }

    async fn remove_txs(&self, confirmed: &[Tx], conflicting: &[Tx]) -> Result<(), StoreError> {
        let mut remove = hash_set(confirmed);
        remove.extend(hash_set(conflicting));

        let mut inner = self.inner.write();
        inner.pool.retain(|tx| !remove.contains(&tx.hash()));
        inner.pool_hashes.retain(|hash| !remove.contains(hash));
        inner.rebuild_pool_view();
        Ok(())
    }

    async fn pool_txs(&self) -> Result<Vec<Tx>, StoreError> {
        Ok(self.inner.read().pool.clone())
    }

    async fn new_pool_view_for_prevouts(
        &self,
        txs: &[Tx],
    ) -> Result<Box<dyn ViewReader>, StoreError> {
        let inner = self.inner.read();
        let outputs = referenced_outpoints(txs)
            .iter()
            .filter_map(|outpoint| inner.pool_view.output(outpoint))
            .collect::<Vec<_>>();
        Ok(Box::new(MemView::from_parts(outputs, [])))
    }

    async fn new_view_for_prevouts(&self, txs: &[Tx]) -> Result<Box<dyn ViewReader>, StoreError> {
        let inner = self.inner.read();
        let outputs = referenced_outpoints(txs)
            .iter()
            .filter_map(|outpoint| inner.outputs.get(outpoint).cloned())
            .collect::<Vec<_>>();
        Ok(Box::new(MemView::from_parts(
            outputs,
            inner.pointers.values().copied(),
        )))
    }

    async fn apply_block(
        &self,
        block: &Block,
        pointers: &BTreeMap<AssetId, AssetDefinitionPointer>,
        outputs: &[Output],
        state: StateTree,
    ) -> Result<Vec<Tx>, StoreError> {
        let mut inner = self.inner.write();
        let expected = inner.blocks.len() as u64 + 1;
        if block.height() != expected {
            return Err(StoreError::Conflict(format!(
                "block height {} does not follow stored height {}",
                block.height(),
                expected - 1
            )));
        }

        for output in outputs {
            if output.spent {
                inner.outputs.remove(&output.outpoint);
            } else {
                inner.outputs.insert(output.outpoint, output.clone());
            }
        }
        for (asset_id, pointer) in pointers {
            inner.pointers.insert(*asset_id, *pointer);
        }

        let mut newly_seen = Vec::new();
        for tx in &block.transactions {
            let hash = tx.hash();
            inner.confirmed.insert(hash);
            if !inner.pool_hashes.contains(&hash) {
                newly_seen.push(tx.clone());
            }
        }
        inner.state = state;
        inner.blocks.push(block.clone());
        Ok(newly_seen)
    }

    async fn latest_block(&self) -> Result<Option<Block>, StoreError> {
        Ok(self.inner.read().blocks.last().cloned())
    }

    async fn block_by_height(&self, height: u64) -> Result<Option<Block>, StoreError> {
        let index = match height.checked_sub(1) {
            Some(i) => i as usize,
            None => return Ok(None),
        };
        Ok(self.inner.read().blocks.get(index).cloned())
    }

    async fn tx_status(&self, hash: &Hash) -> Result<Option<TxStatus>, StoreError> {
        let inner = self.inner.read();
        Ok(if inner.confirmed.contains(hash) {
            Some(TxStatus::Confirmed)
        } else if inner.pool_hashes.contains(hash) {
            Some(TxStatus::Pool)
        } else {
            None
        })
    }

    async fn state_tree(&self) -> Result<StateTree, StoreError> {
        Ok(self.inner.read().state.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{BlockHeader, TxData, TxInput, TxOutput};

    fn asset() -> AssetId {
        AssetId(Hash([7; 32]))
    }

    fn confirmed(n: u8, amount: u64) -> Output {
        Output::new(
            Outpoint::new(Hash([n; 32]), 0),
            TxOutput::new(asset(), amount, vec![0x51]),
        )
    }

    fn spend(prev: Outpoint, amount: u64) -> Tx {
        Tx::new(TxData {
            inputs: vec![TxInput {
                previous: prev,
                ..TxInput::default()
            }],
            outputs: vec![TxOutput::new(asset(), amount, vec![0x51])],
            ..TxData::default()
        })
    }

    fn block(height: u64, txs: Vec<Tx>) -> Block {
        Block {
            header: BlockHeader {
                height,
                ..BlockHeader::default()
            },
            transactions: txs,
        }
    }

    async fn seeded() -> MemStore {
        let store = MemStore::new();
        store
            .apply_block(
                &block(1, vec![]),
                &BTreeMap::new(),
                &[confirmed(1, 10)],
                StateTree::new(),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_pool_view_tracks_spends() {
        let store = seeded().await;
        let prev = Outpoint::new(Hash([1; 32]), 0);
        let tx = spend(prev, 10);
        store.apply_tx(&tx).await.unwrap();

        let pool = store.new_pool_view_for_prevouts(&[spend(prev, 1)]).await.unwrap();
        assert!(pool.output(&prev).unwrap().spent);

        let chain = store.new_view_for_prevouts(&[spend(prev, 1)]).await.unwrap();
        assert!(!chain.output(&prev).unwrap().spent);

        let child = spend(tx.outpoint(0), 10);
        let pool = store.new_pool_view_for_prevouts(&[child]).await.unwrap();
        assert_eq!(pool.output(&tx.outpoint(0)).unwrap().amount(), 10);
    }

    #[tokio::test]
    async fn test_duplicate_pool_tx_conflicts() {
        let store = seeded().await;
        let tx = spend(Outpoint::new(Hash([1; 32]), 0), 10);
        store.apply_tx(&tx).await.unwrap();
        assert!(matches!(store.apply_tx(&tx).await, Err(StoreError::Conflict(_))));
        assert_eq!(store.tx_status(&tx.hash()).await.unwrap(), Some(TxStatus::Pool));
    }

    #[tokio::test]
    async fn test_remove_rebuilds_pool_view() {
        let store = seeded().await;
        let prev = Outpoint::new(Hash([1; 32]), 0);
        let tx = spend(prev, 10);
        store.apply_tx(&tx).await.unwrap();
        store.remove_txs(&[], &[tx.clone()]).await.unwrap();

        assert_eq!(store.pool_len(), 0);
        let pool = store.new_pool_view_for_prevouts(&[tx.clone()]).await.unwrap();
        assert!(pool.output(&prev).is_none());
        assert_eq!(store.tx_status(&tx.hash()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_apply_block_reports_unseen_txs() {
        let store = seeded().await;
        let prev = Outpoint::new(Hash([1; 32]), 0);
        let pooled = spend(prev, 10);
        let unseen = spend(Outpoint::new(Hash([2; 32]), 0), 3);
        store.apply_tx(&pooled).await.unwrap();

        let spent = confirmed(1, 10).into_spent();
        let created = Output::new(pooled.outpoint(0), pooled.outputs[0].clone());
        let new = store
            .apply_block(
                &block(2, vec![pooled.clone(), unseen.clone()]),
                &BTreeMap::new(),
                &[spent, created.clone()],
                StateTree::new(),
            )
            .await
            .unwrap();

        assert_eq!(new, vec![unseen]);
        assert!(store.output(&prev).is_none());
        assert_eq!(store.output(&created.outpoint), Some(created));
        assert_eq!(
            store.tx_status(&pooled.hash()).await.unwrap(),
            Some(TxStatus::Confirmed)
        );
    }

    #[tokio::test]
    async fn test_height_gap_rejected() {
        let store = seeded().await;
        let result = store
            .apply_block(&block(3, vec![]), &BTreeMap::new(), &[], StateTree::new())
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.latest_block().await.unwrap().unwrap().height(), 1);
        assert!(store.block_by_height(0).await.unwrap().is_none());
    }
}

//! Index of confirmed pay-to-contract outputs

use crate::error::ListenerError;
use crate::ports::ChainListener;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::script::ContractProgram;
use shared_types::{Block, Hash, Outpoint, Tx};
use std::collections::{BTreeSet, HashMap};

#[derive(Default)]
struct Inner {
    by_contract: HashMap<Hash, BTreeSet<Outpoint>>,
    contract_of: HashMap<Outpoint, Hash>,
}

/// Tracks unspent confirmed outputs locked by each contract.
#[derive(Default)]
pub struct ContractIndex {
    inner: RwLock<Inner>,
}

impl ContractIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unspent outpoints locked by `contract_hash`, in outpoint order.
    pub fn outpoints(&self, contract_hash: &Hash) -> Vec<Outpoint> {
        self.inner
            .read()
            .by_contract
            .get(contract_hash)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChainListener for ContractIndex {
    fn name(&self) -> &str {
        "contract-index"
    }

    async fn on_tx(&self, _tx: &Tx) -> Result<(), ListenerError> {
        Ok(())
    }

    async fn on_block(&self, block: &Block, _conflicts: &[Tx]) -> Result<(), ListenerError> {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        for tx in &block.transactions {
            for input in &tx.inputs {
                if let Some(contract) = inner.contract_of.remove(&input.previous) {
                    if let Some(set) = inner.by_contract.get_mut(&contract) {
                        set.remove(&input.previous);
                        if set.is_empty() {
                            inner.by_contract.remove(&contract);
                        }
                    }
                }
            }
            for (index, output) in tx.outputs.iter().enumerate() {
                let Some(program) = ContractProgram::parse(&output.script) else {
                    continue;
                };
                let outpoint = tx.outpoint(index as u32);
                inner.contract_of.insert(outpoint, program.contract_hash);
                inner
                    .by_contract
                    .entry(program.contract_hash)
                    .or_default()
                    .insert(outpoint);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{AssetId, BlockHeader, TxData, TxInput, TxOutput};

    fn block(txs: Vec<Tx>) -> Block {
        Block {
            header: BlockHeader::default(),
            transactions: txs,
        }
    }

    fn pay_to(contract: Hash, from: Outpoint) -> Tx {
        let program = ContractProgram {
            contract_hash: contract,
            params: vec![vec![1]],
        }
        .to_program();
        Tx::new(TxData {
            inputs: vec![TxInput {
                previous: from,
                ..TxInput::default()
            }],
            outputs: vec![
                TxOutput::new(AssetId(Hash([1; 32])), 5, program),
                TxOutput::new(AssetId(Hash([1; 32])), 5, vec![0x51]),
            ],
            ..TxData::default()
        })
    }

    #[tokio::test]
    async fn test_tracks_contract_outputs() {
        let index = ContractIndex::new();
        let contract = Hash([3; 32]);
        let tx = pay_to(contract, Outpoint::new(Hash([9; 32]), 0));
        index.on_block(&block(vec![tx.clone()]), &[]).await.unwrap();
        assert_eq!(index.outpoints(&contract), vec![tx.outpoint(0)]);

        let spend = pay_to(Hash([4; 32]), tx.outpoint(0));
        index.on_block(&block(vec![spend]), &[]).await.unwrap();
        assert!(index.outpoints(&contract).is_empty());
    }
}

//! Account UTXO index fed by confirmed blocks

use crate::domain::{Source, Utxo};
use crate::error::Result;
use crate::ports::UtxoStore;
use async_trait::async_trait;
use fc_04_chain::{ChainListener, ListenerError};
use parking_lot::RwLock;
use shared_types::{Block, Outpoint, Tx};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Owner of a control program.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProgramOwner {
    account_id: String,
    derivation_index: u64,
}

#[derive(Default)]
struct Inner {
    programs: HashMap<Vec<u8>, ProgramOwner>,
    utxos: BTreeMap<Outpoint, Utxo>,
    by_source: HashMap<Source, BTreeSet<Outpoint>>,
}

impl Inner {
    fn insert(&mut self, utxo: Utxo) {
        self.by_source
            .entry(utxo.source())
            .or_default()
            .insert(utxo.outpoint);
        self.utxos.insert(utxo.outpoint, utxo);
    }

    fn remove(&mut self, outpoint: &Outpoint) -> bool {
        let Some(utxo) = self.utxos.remove(outpoint) else {
            return false;
        };
        let source = utxo.source();
        if let Some(set) = self.by_source.get_mut(&source) {
            set.remove(outpoint);
            if set.is_empty() {
                self.by_source.remove(&source);
            }
        }
        true
    }
}

/// Confirmed UTXOs of registered account control programs.
#[derive(Default)]
pub struct AccountUtxoIndex {
    inner: RwLock<Inner>,
}

impl AccountUtxoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute outputs paying to `program` to `account_id`.
    pub fn register_program(
        &self,
        program: Vec<u8>,
        account_id: impl Into<String>,
        derivation_index: u64,
    ) {
        self.inner.write().programs.insert(
            program,
            ProgramOwner {
                account_id: account_id.into(),
                derivation_index,
            },
        );
    }

    /// Add a UTXO directly, e.g. when backfilling from stored outputs.
    pub fn insert_utxo(&self, utxo: Utxo) {
        self.inner.write().insert(utxo);
    }

    /// Total unspent amount of `source`.
    pub fn balance(&self, source: &Source) -> u128 {
        let inner = self.inner.read();
        inner
            .by_source
            .get(source)
            .map(|set| {
                set.iter()
                    .filter_map(|op| inner.utxos.get(op))
                    .map(|u| u.amount as u128)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.inner.read().utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn index_tx(inner: &mut Inner, tx: &Tx) -> (usize, usize) {
        let spent = tx
            .inputs
            .iter()
            .filter(|input| inner.remove(&input.previous))
            .count();

        let mut added = 0;
        for (index, output) in tx.outputs.iter().enumerate() {
            let Some(owner) = inner.programs.get(&output.script).cloned() else {
                continue;
            };
            inner.insert(Utxo {
                outpoint: tx.outpoint(index as u32),
                asset_id: output.asset_id,
                amount: output.amount,
                control_program: output.script.clone(),
                account_id: owner.account_id,
                derivation_index: owner.derivation_index,
            });
            added += 1;
        }
        (spent, added)
    }
}

#[async_trait]
impl UtxoStore for AccountUtxoIndex {
    async fn unspent_utxos(&self, source: &Source) -> Result<Vec<Utxo>> {
        let inner = self.inner.read();
        Ok(inner
            .by_source
            .get(source)
            .map(|set| {
                set.iter()
                    .filter_map(|op| inner.utxos.get(op).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn utxo(&self, outpoint: &Outpoint) -> Result<Option<Utxo>> {
        Ok(self.inner.read().utxos.get(outpoint).cloned())
    }
}

#[async_trait]
impl ChainListener for AccountUtxoIndex {
    fn name(&self) -> &str {
        "account-utxo-index"
    }

    async fn on_tx(&self, _tx: &Tx) -> std::result::Result<(), ListenerError> {
        Ok(())
    }

    async fn on_block(
        &self,
        block: &Block,
        _conflicts: &[Tx],
    ) -> std::result::Result<(), ListenerError> {
        let mut inner = self.inner.write();
        let (mut spent, mut added) = (0, 0);
        for tx in &block.transactions {
            let (s, a) = Self::index_tx(&mut inner, tx);
            spent += s;
            added += a;
        }
        debug!(
            "[fc-05] Block {} indexed: {} account UTXOs added, {} spent",
            block.height(),
            added,
            spent
        );
        Ok(())
    }
}

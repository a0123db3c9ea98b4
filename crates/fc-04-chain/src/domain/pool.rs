//! Pending pool ordering helpers

use shared_types::{Hash, Outpoint, Tx};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Order `txs` so every transaction follows the pool transactions it
/// spends from. Otherwise the input order is kept.
pub fn topological_order(txs: Vec<Tx>) -> Vec<Tx> {
    let position: HashMap<Hash, usize> = txs
        .iter()
        .enumerate()
        .map(|(i, tx)| (tx.hash(), i))
        .collect();
    let parents: Vec<Vec<usize>> = txs
        .iter()
        .enumerate()
        .map(|(i, tx)| {
            tx.inputs
                .iter()
                .filter_map(|input| position.get(&input.previous.hash).copied())
                .filter(|&p| p != i)
                .collect()
        })
        .collect();

    let mut slots: Vec<Option<Tx>> = txs.into_iter().map(Some).collect();
    let mut emitted = vec![false; slots.len()];
    let mut ordered = Vec::with_capacity(slots.len());

    loop {
        let mut progressed = false;
        for i in 0..slots.len() {
            if emitted[i] || !parents[i].iter().all(|&p| emitted[p]) {
                continue;
            }
            emitted[i] = true;
            progressed = true;
            if let Some(tx) = slots[i].take() {
                ordered.push(tx);
            }
        }
        if !progressed {
            break;
        }
    }

    // Cycles cannot come from valid transactions; keep them at the end so
    // validation rejects them.
    ordered.extend(slots.into_iter().flatten());
    ordered
}

/// Outpoints a view must cover to validate `txs`: every spent outpoint,
/// and the outputs of issuance transactions for the replay check.
pub fn referenced_outpoints(txs: &[Tx]) -> BTreeSet<Outpoint> {
    let mut outpoints = BTreeSet::new();
    for tx in txs {
        if tx.is_issuance() {
            outpoints.extend((0..tx.outputs.len() as u32).map(|i| tx.outpoint(i)));
            continue;
        }
        outpoints.extend(tx.inputs.iter().map(|input| input.previous));
    }
    outpoints
}

/// Hashes of `txs`.
pub(crate) fn hash_set(txs: &[Tx]) -> HashSet<Hash> {
    txs.iter().map(Tx::hash).collect()
}

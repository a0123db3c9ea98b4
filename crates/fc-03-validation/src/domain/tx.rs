use super::errors::TxRejection;
use crate::ports::{PredicateEngine, SpendContext};
use fc_02_state::{AssetDefinitionPointer, Output, View, ViewReader};
use shared_types::script;
use shared_types::{double_hash, AssetId, Hash, SigHashCache, Timestamp, Tx, TxInput};
use std::collections::{BTreeMap, HashSet};

/// Inputs to transaction validation beyond the transaction and the view.
#[derive(Clone, Copy)]
pub struct TxParams<'a> {
    /// Hash of the chain's genesis block; issuances must reference it.
    pub genesis_hash: Hash,
    /// Block timestamp for block validation, wall clock for pool admission.
    pub timestamp: Timestamp,
    pub engine: &'a dyn PredicateEngine,
    /// Skip predicate evaluation (trusted-signer blocks only).
    pub skip_predicates: bool,
}

impl<'a> TxParams<'a> {
    pub fn new(genesis_hash: Hash, timestamp: Timestamp, engine: &'a dyn PredicateEngine) -> Self {
        Self {
            genesis_hash,
            timestamp,
            engine,
            skip_predicates: false,
        }
    }
}

/// Validate `tx` against `view` without changing anything.
pub fn validate_tx<V: ViewReader>(
    view: &V,
    tx: &Tx,
    params: &TxParams<'_>,
) -> Result<(), TxRejection> {
    check_well_formed(tx)?;
    check_inputs_unspent(view, tx)?;

    if tx.lock_time > params.timestamp {
        return Err(TxRejection::LockTime {
            lock_time: tx.lock_time,
            timestamp: params.timestamp,
        });
    }

    if tx.is_issuance() {
        return check_issuance(view, tx, &params.genesis_hash);
    }

    check_balance(view, tx)?;

    if !params.skip_predicates {
        check_predicates(view, tx, params.engine)?;
    }
    Ok(())
}

/// Apply the effects of an already validated `tx` to `view`.
///
/// Consumed outputs are saved back as spent so later transactions in the
/// same batch see them as spent.
pub fn apply_tx<V: View>(view: &mut V, tx: &Tx, genesis_hash: &Hash) -> Result<(), TxRejection> {
    for (index, input) in tx.inputs.iter().enumerate() {
        if input.is_issuance() {
            apply_asset_definition(view, input, genesis_hash)?;
            continue;
        }
        let prev = view
            .output(&input.previous)
            .ok_or(TxRejection::MissingInput {
                index,
                outpoint: input.previous,
            })?;
        view.save_output(prev.into_spent());
    }

    for (index, output) in tx.outputs.iter().enumerate() {
        view.save_output(Output::new(tx.outpoint(index as u32), output.clone()));
    }
    Ok(())
}

/// `validate_tx` followed by `apply_tx` on the same view.
pub fn validate_and_apply_tx<V: View>(
    view: &mut V,
    tx: &Tx,
    params: &TxParams<'_>,
) -> Result<(), TxRejection> {
    validate_tx(view, tx, params)?;
    apply_tx(view, tx, &params.genesis_hash)
}

fn check_well_formed(tx: &Tx) -> Result<(), TxRejection> {
    if tx.inputs.is_empty() {
        return Err(TxRejection::NoInputs);
    }

    let issuance = tx.is_issuance();
    if issuance && tx.inputs.len() != 1 {
        return Err(TxRejection::IssuanceInputCount {
            count: tx.inputs.len(),
        });
    }

    let mut seen = HashSet::with_capacity(tx.inputs.len());
    for (index, input) in tx.inputs.iter().enumerate() {
        if !seen.insert(input.previous) {
            return Err(TxRejection::DuplicateInput {
                index,
                outpoint: input.previous,
            });
        }
    }

    if !issuance {
        if let Some(index) = tx.outputs.iter().position(|o| o.amount == 0) {
            return Err(TxRejection::ZeroAmountOutput { index });
        }
    }
    Ok(())
}

fn check_inputs_unspent<V: ViewReader>(view: &V, tx: &Tx) -> Result<(), TxRejection> {
    for (index, input) in tx.inputs.iter().enumerate() {
        if input.is_issuance() {
            continue;
        }
        match view.output(&input.previous) {
            None => {
                return Err(TxRejection::MissingInput {
                    index,
                    outpoint: input.previous,
                })
            }
            Some(prev) if prev.spent => {
                return Err(TxRejection::InputSpent {
                    index,
                    outpoint: input.previous,
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// The issuance program is the final push of an issuance input's
/// signature script.
pub(crate) fn issuance_program(input: &TxInput) -> Result<Vec<u8>, TxRejection> {
    script::parse_pushes(&input.signature_script)
        .ok()
        .and_then(|mut pushes| pushes.pop())
        .filter(|program| !program.is_empty())
        .ok_or(TxRejection::IssuanceProgramMissing)
}

fn check_issuance<V: ViewReader>(view: &V, tx: &Tx, genesis_hash: &Hash) -> Result<(), TxRejection> {
    let input = &tx.inputs[0];
    if input.previous.hash != *genesis_hash {
        return Err(TxRejection::IssuanceChainMismatch {
            expected: *genesis_hash,
            actual: input.previous.hash,
        });
    }

    let expected = AssetId::new(&issuance_program(input)?, genesis_hash);
    for (index, output) in tx.outputs.iter().enumerate() {
        if output.asset_id != expected {
            return Err(TxRejection::IssuanceAssetMismatch {
                index,
                expected,
                actual: output.asset_id,
            });
        }
    }

    for index in 0..tx.outputs.len() {
        let outpoint = tx.outpoint(index as u32);
        if view.output(&outpoint).is_some() {
            return Err(TxRejection::IssuanceReplay { outpoint });
        }
    }
    Ok(())
}

fn check_balance<V: ViewReader>(view: &V, tx: &Tx) -> Result<(), TxRejection> {
    let mut net: BTreeMap<AssetId, i128> = BTreeMap::new();
    for (index, input) in tx.inputs.iter().enumerate() {
        let prev = view
            .output(&input.previous)
            .ok_or(TxRejection::MissingInput {
                index,
                outpoint: input.previous,
            })?;
        *net.entry(prev.asset_id()).or_insert(0) += prev.amount() as i128;
    }
    for output in &tx.outputs {
        *net.entry(output.asset_id).or_insert(0) -= output.amount as i128;
    }

    match net.into_iter().find(|(_, n)| *n != 0) {
        Some((asset_id, net)) => Err(TxRejection::Unbalanced { asset_id, net }),
        None => Ok(()),
    }
}

fn check_predicates<V: ViewReader>(
    view: &V,
    tx: &Tx,
    engine: &dyn PredicateEngine,
) -> Result<(), TxRejection> {
    let sig_hashes = SigHashCache::new(tx.data());
    for (index, input) in tx.inputs.iter().enumerate() {
        let prev = view
            .output(&input.previous)
            .ok_or(TxRejection::MissingInput {
                index,
                outpoint: input.previous,
            })?;
        let ctx = SpendContext {
            tx,
            index,
            prev: &prev,
            view,
            sig_hashes: &sig_hashes,
        };
        engine
            .check(&ctx)
            .map_err(|source| TxRejection::Predicate { index, source })?;
    }
    Ok(())
}

fn apply_asset_definition<V: View>(
    view: &mut V,
    input: &TxInput,
    genesis_hash: &Hash,
) -> Result<(), TxRejection> {
    if input.asset_definition.is_empty() {
        return Ok(());
    }
    let asset_id = AssetId::new(&issuance_program(input)?, genesis_hash);
    let definition_hash = double_hash(&input.asset_definition);
    let current = view
        .asset_definition_pointer(&asset_id)
        .map(|p| p.definition_hash);
    if current != Some(definition_hash) {
        view.save_asset_definition_pointer(AssetDefinitionPointer::new(asset_id, definition_hash));
    }
    Ok(())
}

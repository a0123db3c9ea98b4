use super::entities::{AssetDefinitionPointer, Output};
use super::errors::StateError;
use fc_01_patricia::PatriciaTree;
use shared_types::{double_hash, AssetId, Hash};
use std::collections::BTreeMap;

/// Patricia commitment to the ledger state.
///
/// Leaves:
///
/// | Item | Key | Value |
/// |------|-----|-------|
/// | unspent output | `H(outpoint)` | `H(outpoint ++ output)` |
/// | asset definition pointer | `H(0x01 ++ asset)` | `H(asset ++ definition hash)` |
/// | asset circulation | `H(0x02 ++ asset)` | `H(asset ++ issued total)` |
///
/// Spent outputs are removed, so the root commits to the unspent set only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateTree {
    tree: PatriciaTree<Hash>,
    circulation: BTreeMap<AssetId, u128>,
}

const CIRCULATION_TAG: u8 = 0x02;

impl StateTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an unspent output or remove a spent one.
    pub fn apply_output(&mut self, output: &Output) -> Result<(), StateError> {
        let key = output.state_key();
        if output.spent {
            self.tree.delete(key.as_bytes())?;
        } else {
            self.tree.insert(key.as_bytes(), output.commitment())?;
        }
        Ok(())
    }

    pub fn apply_pointer(&mut self, pointer: &AssetDefinitionPointer) -> Result<(), StateError> {
        self.tree
            .insert(pointer.state_key().as_bytes(), pointer.commitment())?;
        Ok(())
    }

    /// Record `amount` newly issued units of `asset_id`.
    pub fn add_issuance(&mut self, asset_id: AssetId, amount: u64) -> Result<(), StateError> {
        let total = self.circulation.entry(asset_id).or_insert(0);
        *total += amount as u128;

        let mut key = vec![CIRCULATION_TAG];
        key.extend_from_slice(asset_id.as_bytes());
        let mut value = asset_id.as_bytes().to_vec();
        value.extend_from_slice(&total.to_le_bytes());
        self.tree
            .insert(double_hash(&key).as_bytes(), double_hash(&value))?;
        Ok(())
    }

    /// Total units of `asset_id` ever issued.
    pub fn circulation(&self, asset_id: &AssetId) -> u128 {
        self.circulation.get(asset_id).copied().unwrap_or(0)
    }

    pub fn contains_output(&self, output: &Output) -> Result<bool, StateError> {
        Ok(self.tree.contains(output.state_key().as_bytes())?)
    }

    pub fn root_hash(&self) -> Hash {
        self.tree.root_hash()
    }

    /// Number of committed leaves.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

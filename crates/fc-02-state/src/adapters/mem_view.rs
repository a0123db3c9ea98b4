use crate::domain::{AssetDefinitionPointer, Output};
use crate::ports::{ViewReader, ViewWriter};
use shared_types::{AssetId, Outpoint};
use std::collections::BTreeMap;

/// In-memory view.
///
/// Used as the writable overlay of a validation pass and as the loaded
/// prevout subset handed out by stores. Iteration is in key order so
/// deltas derived from it are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemView {
    outputs: BTreeMap<Outpoint, Output>,
    pointers: BTreeMap<AssetId, AssetDefinitionPointer>,
}

impl MemView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a view from existing records.
    pub fn from_parts(
        outputs: impl IntoIterator<Item = Output>,
        pointers: impl IntoIterator<Item = AssetDefinitionPointer>,
    ) -> Self {
        let mut view = Self::new();
        for output in outputs {
            view.save_output(output);
        }
        for pointer in pointers {
            view.save_asset_definition_pointer(pointer);
        }
        view
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.values()
    }

    pub fn pointers(&self) -> impl Iterator<Item = &AssetDefinitionPointer> {
        self.pointers.values()
    }

    /// Consume into `(outputs, pointers)`, each in key order.
    pub fn into_parts(self) -> (Vec<Output>, BTreeMap<AssetId, AssetDefinitionPointer>) {
        (self.outputs.into_values().collect(), self.pointers)
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty() && self.pointers.is_empty()
    }
}

impl ViewReader for MemView {
    fn output(&self, outpoint: &Outpoint) -> Option<Output> {
        self.outputs.get(outpoint).cloned()
    }

    fn asset_definition_pointer(&self, asset_id: &AssetId) -> Option<AssetDefinitionPointer> {
        self.pointers.get(asset_id).copied()
    }
}

impl ViewWriter for MemView {
    fn save_output(&mut self, output: Output) {
        self.outputs.insert(output.outpoint, output);
    }

    fn save_asset_definition_pointer(&mut self, pointer: AssetDefinitionPointer) {
        self.pointers.insert(pointer.asset_id, pointer);
    }
}

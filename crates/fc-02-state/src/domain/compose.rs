use super::entities::{AssetDefinitionPointer, Output};
use crate::adapters::MemView;
use crate::ports::{ViewReader, ViewWriter};
use shared_types::{AssetId, Outpoint};

/// A writable overlay stacked on read-only layers.
///
/// Reads check the overlay first, then each reader in order, and return the
/// first hit. Writes go only to the overlay; nothing underneath is mutated
/// until the caller persists the overlay itself.
pub struct ComposedView<'a> {
    overlay: MemView,
    readers: Vec<&'a dyn ViewReader>,
}

/// Stack `overlay` on `readers` (highest priority first).
pub fn compose<'a>(overlay: MemView, readers: Vec<&'a dyn ViewReader>) -> ComposedView<'a> {
    ComposedView { overlay, readers }
}

impl<'a> ComposedView<'a> {
    pub fn overlay(&self) -> &MemView {
        &self.overlay
    }

    /// Drop the readers and keep the writes.
    pub fn into_overlay(self) -> MemView {
        self.overlay
    }
}

impl ViewReader for ComposedView<'_> {
    fn output(&self, outpoint: &Outpoint) -> Option<Output> {
        self.overlay
            .output(outpoint)
            .or_else(|| self.readers.iter().find_map(|r| r.output(outpoint)))
    }

    fn asset_definition_pointer(&self, asset_id: &AssetId) -> Option<AssetDefinitionPointer> {
        self.overlay.asset_definition_pointer(asset_id).or_else(|| {
            self.readers
                .iter()
                .find_map(|r| r.asset_definition_pointer(asset_id))
        })
    }
}

impl ViewWriter for ComposedView<'_> {
    fn save_output(&mut self, output: Output) {
        self.overlay.save_output(output);
    }

    fn save_asset_definition_pointer(&mut self, pointer: AssetDefinitionPointer) {
        self.overlay.save_asset_definition_pointer(pointer);
    }
}

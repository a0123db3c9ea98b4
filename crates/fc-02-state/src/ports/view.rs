use crate::domain::{AssetDefinitionPointer, Output};
use shared_types::{AssetId, Outpoint};
use std::sync::Arc;

/// Read access to ledger state.
///
/// `None` means the layer has no record; a spent record is still `Some`.
pub trait ViewReader: Send + Sync {
    fn output(&self, outpoint: &Outpoint) -> Option<Output>;

    fn asset_definition_pointer(&self, asset_id: &AssetId) -> Option<AssetDefinitionPointer>;
}

/// Write access to an in-memory overlay.
pub trait ViewWriter {
    fn save_output(&mut self, output: Output);

    fn save_asset_definition_pointer(&mut self, pointer: AssetDefinitionPointer);
}

/// A readable and writable view.
pub trait View: ViewReader + ViewWriter {}

impl<T: ViewReader + ViewWriter> View for T {}

impl<T: ViewReader + ?Sized> ViewReader for Box<T> {
    fn output(&self, outpoint: &Outpoint) -> Option<Output> {
        (**self).output(outpoint)
    }

    fn asset_definition_pointer(&self, asset_id: &AssetId) -> Option<AssetDefinitionPointer> {
        (**self).asset_definition_pointer(asset_id)
    }
}

impl<T: ViewReader + ?Sized> ViewReader for Arc<T> {
    fn output(&self, outpoint: &Outpoint) -> Option<Output> {
        (**self).output(outpoint)
    }

    fn asset_definition_pointer(&self, asset_id: &AssetId) -> Option<AssetDefinitionPointer> {
        (**self).asset_definition_pointer(asset_id)
    }
}

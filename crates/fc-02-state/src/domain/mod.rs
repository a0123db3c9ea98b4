//! State domain.

pub mod compose;
pub mod entities;
pub mod errors;
pub mod state_tree;

pub use compose::{compose, ComposedView};
pub use entities::{AssetDefinitionPointer, Output};
pub use errors::StateError;
pub use state_tree::StateTree;

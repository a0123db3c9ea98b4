//! Patricia tree domain.

pub mod bits;
pub mod errors;
pub mod node;
pub mod tree;

pub use bits::Bits;
pub use errors::TreeError;
pub use node::Hashable;
pub use tree::PatriciaTree;

/// Length in bits of every key.
pub const KEY_BITS: usize = 256;

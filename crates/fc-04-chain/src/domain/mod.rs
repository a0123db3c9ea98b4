//! Chain controller domain logic

pub mod genesis;
pub mod pool;
pub mod signer;

pub use genesis::{genesis_block, GENESIS_HEIGHT};
pub use pool::{referenced_outpoints, topological_order};
pub use signer::sign_block;

//! Adapters for the chain controller ports

pub mod contract_index;
pub mod memory_store;

pub use contract_index::ContractIndex;
pub use memory_store::MemStore;

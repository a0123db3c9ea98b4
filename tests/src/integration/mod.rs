//! Cross-crate integration tests

#[cfg(test)]
pub(crate) mod harness;

pub mod chain_flows;
pub mod properties;
pub mod reservations;

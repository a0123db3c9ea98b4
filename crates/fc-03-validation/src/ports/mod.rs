//! Validation ports.

pub mod predicate;

pub use predicate::{ContractPredicate, PredicateEngine, SpendContext};

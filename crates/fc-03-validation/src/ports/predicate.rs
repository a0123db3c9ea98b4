use crate::domain::PredicateError;
use fc_02_state::{Output, ViewReader};
use shared_types::{SigHashCache, Tx};

/// Everything a predicate may inspect when judging one input.
pub struct SpendContext<'a> {
    /// The whole spending transaction.
    pub tx: &'a Tx,
    /// Index of the input being judged.
    pub index: usize,
    /// The output being spent.
    pub prev: &'a Output,
    /// Ledger state as of this transaction.
    pub view: &'a dyn ViewReader,
    /// Shared signature-hash intermediates for `tx`.
    pub sig_hashes: &'a SigHashCache<'a>,
}

impl SpendContext<'_> {
    /// The signature script of the input being judged.
    pub fn signature_script(&self) -> &[u8] {
        &self.tx.inputs[self.index].signature_script
    }
}

/// Deterministic spending-predicate evaluator.
///
/// Must depend only on the context; the same context always yields the same
/// verdict.
pub trait PredicateEngine: Send + Sync {
    fn check(&self, ctx: &SpendContext<'_>) -> Result<(), PredicateError>;
}

/// Predicate for one pay-to-contract hash.
pub trait ContractPredicate: Send + Sync {
    /// Judge a spend of an output locked by this contract with `params`.
    fn check(&self, params: &[Vec<u8>], ctx: &SpendContext<'_>) -> Result<(), PredicateError>;
}

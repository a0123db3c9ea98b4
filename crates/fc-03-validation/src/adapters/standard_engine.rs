use crate::domain::{count_valid_signatures, PredicateError};
use crate::ports::{ContractPredicate, PredicateEngine, SpendContext};
use shared_crypto::ecdsa::SIGNATURE_LEN;
use shared_crypto::Secp256k1Signature;
use shared_types::script::{self, ContractProgram, MultisigProgram};
use shared_types::{Hash, SigHashType};
use std::collections::HashMap;
use std::sync::Arc;

/// Predicate engine for the program shapes the ledger produces.
///
/// | Program | Satisfied by |
/// |---------|--------------|
/// | `OP_TRUE` | anything |
/// | m-of-n multisig / single key | m pushes of `sig ++ sighash byte`, in key order |
/// | pay-to-contract | the contract predicate registered for its hash |
#[derive(Default, Clone)]
pub struct StandardEngine {
    contracts: HashMap<Hash, Arc<dyn ContractPredicate>>,
}

impl StandardEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the predicate evaluated for outputs paying to `contract_hash`.
    pub fn with_contract(mut self, contract_hash: Hash, predicate: Arc<dyn ContractPredicate>) -> Self {
        self.contracts.insert(contract_hash, predicate);
        self
    }

    fn check_multisig(
        &self,
        program: &MultisigProgram,
        ctx: &SpendContext<'_>,
    ) -> Result<(), PredicateError> {
        let mut sigs = Vec::new();
        for push in script::parse_pushes(ctx.signature_script())? {
            if push.len() != SIGNATURE_LEN + 1 {
                return Err(PredicateError::MalformedSignature { len: push.len() });
            }
            let type_byte = push[SIGNATURE_LEN];
            let sighash =
                SigHashType::from_byte(type_byte).ok_or(PredicateError::BadSigHashType(type_byte))?;
            let sig = Secp256k1Signature::from_slice(&push[..SIGNATURE_LEN])
                .map_err(|_| PredicateError::MalformedSignature { len: push.len() })?;
            let digest = ctx
                .sig_hashes
                .hash(ctx.index, ctx.prev.asset_amount(), sighash)
                .ok_or(PredicateError::InputOutOfRange { index: ctx.index })?;
            sigs.push((sig, digest));
        }

        let valid = count_valid_signatures(&program.pubkeys, &sigs);
        if valid < program.required {
            return Err(PredicateError::NotEnoughSignatures {
                required: program.required,
                valid,
            });
        }
        Ok(())
    }
}

impl PredicateEngine for StandardEngine {
    fn check(&self, ctx: &SpendContext<'_>) -> Result<(), PredicateError> {
        let program = ctx.prev.script();
        if script::is_true_program(program) {
            return Ok(());
        }
        if let Some(multisig) = MultisigProgram::parse(program) {
            return self.check_multisig(&multisig, ctx);
        }
        if let Some(contract) = ContractProgram::parse(program) {
            let predicate = self
                .contracts
                .get(&contract.contract_hash)
                .ok_or(PredicateError::UnknownContract(contract.contract_hash))?;
            return predicate.check(&contract.params, ctx);
        }
        Err(PredicateError::UnsupportedProgram)
    }
}

//! Transaction templates

use crate::error::{BuildError, Result};
use fc_05_utxodb::ReservationId;
use serde::{Deserialize, Serialize};
use shared_crypto::{Secp256k1PublicKey, Secp256k1Signature};
use shared_types::script::{self, MultisigProgram};
use shared_types::{AssetAmount, Hash, SigHashCache, SigHashType, TxData};

/// What a signer needs to know about one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningInstruction {
    /// Asset and amount of the spent output (or of the issuance).
    pub asset_amount: AssetAmount,
    pub sig_hash_type: SigHashType,
    /// Digest to sign; filled in by `Template::compute_sig_hashes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig_hash: Option<Hash>,
    /// Signatures the spent program requires.
    pub required: usize,
    /// Keys of the spent program, in script order.
    #[serde(default)]
    pub pubkeys: Vec<Secp256k1PublicKey>,
    /// Signatures in the order they were attached.
    #[serde(default)]
    pub signatures: Vec<Secp256k1Signature>,
    /// Issuance program for issuance inputs; empty otherwise.
    #[serde(default, with = "hex", skip_serializing_if = "Vec::is_empty")]
    pub issuance_program: Vec<u8>,
}

impl SigningInstruction {
    /// Instruction for spending an output locked by `program`.
    pub fn for_program(asset_amount: AssetAmount, program: &[u8]) -> Result<Self> {
        let (required, pubkeys) = if script::is_true_program(program) {
            (0, Vec::new())
        } else {
            let multisig = MultisigProgram::parse(program).ok_or_else(|| {
                BuildError::BadTemplate(format!(
                    "cannot sign for program {}",
                    hex::encode(program)
                ))
            })?;
            (multisig.required, multisig.pubkeys)
        };
        Ok(Self {
            asset_amount,
            sig_hash_type: SigHashType::ALL,
            sig_hash: None,
            required,
            pubkeys,
            signatures: Vec::new(),
            issuance_program: Vec::new(),
        })
    }

    /// Instruction for an issuance input of `program`.
    pub fn for_issuance(asset_amount: AssetAmount, program: Vec<u8>) -> Self {
        Self {
            asset_amount,
            sig_hash_type: SigHashType::ALL,
            sig_hash: None,
            required: 0,
            pubkeys: Vec::new(),
            signatures: Vec::new(),
            issuance_program: program,
        }
    }

    pub fn is_issuance(&self) -> bool {
        !self.issuance_program.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.signatures.len() >= self.required
    }
}

/// An unsigned transaction plus per-input signing instructions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub unsigned_tx: TxData,
    /// One entry per input of `unsigned_tx`, in input order.
    pub signing_instructions: Vec<SigningInstruction>,
    /// Genesis hash of the chain the template targets.
    pub chain_id: Hash,
    /// Reservations backing the inputs, released if the build is abandoned.
    #[serde(default)]
    pub reservations: Vec<ReservationId>,
}

impl Template {
    pub fn new(chain_id: Hash) -> Self {
        Self {
            unsigned_tx: TxData::default(),
            signing_instructions: Vec::new(),
            chain_id,
            reservations: Vec::new(),
        }
    }

    /// Fill in the digest every input must sign.
    ///
    /// Existing signatures are dropped when a digest changes.
    pub fn compute_sig_hashes(&mut self) -> Result<()> {
        self.check_shape()?;
        let cache = SigHashCache::new(&self.unsigned_tx);
        for (index, instruction) in self.signing_instructions.iter_mut().enumerate() {
            let hash = cache
                .hash(index, instruction.asset_amount, instruction.sig_hash_type)
                .ok_or_else(|| BuildError::BadTemplate(format!("no input {index}")))?;
            if instruction.sig_hash != Some(hash) {
                instruction.signatures.clear();
            }
            instruction.sig_hash = Some(hash);
        }
        Ok(())
    }

    /// True once every input has the signatures it needs.
    pub fn is_signed(&self) -> bool {
        self.signing_instructions.iter().all(SigningInstruction::is_complete)
    }

    pub(crate) fn check_shape(&self) -> Result<()> {
        if self.signing_instructions.len() != self.unsigned_tx.inputs.len() {
            return Err(BuildError::BadTemplate(format!(
                "{} signing instructions for {} inputs",
                self.signing_instructions.len(),
                self.unsigned_tx.inputs.len()
            )));
        }
        Ok(())
    }
}

/// Merge templates into one, concatenating inputs, outputs and
/// reservations in argument order.
///
/// All templates must target the same chain. Metadata and lock time are
/// taken from the first template that sets them.
pub fn combine(templates: &[Template]) -> Result<Template> {
    let Some(first) = templates.first() else {
        return Err(BuildError::BadTemplate("nothing to combine".into()));
    };

    let mut combined = Template::new(first.chain_id);
    for template in templates {
        if template.chain_id != first.chain_id {
            return Err(BuildError::ChainMismatch {
                expected: first.chain_id,
                actual: template.chain_id,
            });
        }
        template.check_shape()?;

        let tx = &template.unsigned_tx;
        combined.unsigned_tx.inputs.extend(tx.inputs.iter().cloned());
        combined.unsigned_tx.outputs.extend(tx.outputs.iter().cloned());
        if combined.unsigned_tx.metadata.is_empty() {
            combined.unsigned_tx.metadata = tx.metadata.clone();
        }
        combined.unsigned_tx.lock_time = combined.unsigned_tx.lock_time.max(tx.lock_time);
        combined
            .signing_instructions
            .extend(template.signing_instructions.iter().cloned());
        combined.reservations.extend(&template.reservations);
    }
    combined.compute_sig_hashes()?;
    Ok(combined)
}

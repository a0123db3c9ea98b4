//! Block signing

use crate::error::{ChainError, Result};
use fc_03_validation::sign_multisig;
use shared_crypto::Secp256k1KeyPair;
use shared_types::script::{self, MultisigProgram};
use shared_types::BlockHeader;

/// Fill `header.signature_script` with signatures satisfying the previous
/// block's output script, using whichever of `keys` it names.
///
/// Signatures are pushed in the order the script lists its keys. An
/// anyone-can-sign script leaves the header unsigned.
pub fn sign_block(
    header: &mut BlockHeader,
    prev_output_script: &[u8],
    keys: &[Secp256k1KeyPair],
) -> Result<()> {
    if script::is_true_program(prev_output_script) {
        header.signature_script.clear();
        return Ok(());
    }
    let program = MultisigProgram::parse(prev_output_script).ok_or_else(|| {
        ChainError::InvalidConfig("previous block output script is not a signer set".into())
    })?;

    let sigs = sign_multisig(
        &program.pubkeys,
        program.required,
        &header.hash_for_sig(),
        keys,
    )?;
    let pushes: Vec<Vec<u8>> = sigs.iter().map(|sig| sig.as_bytes().to_vec()).collect();
    header.signature_script = script::push_only(&pushes);
    Ok(())
}

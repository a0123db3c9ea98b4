//! Signing and witness assembly

use super::template::{SigningInstruction, Template};
use crate::error::{BuildError, Result};
use shared_crypto::{Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
use shared_types::{script, Hash, Tx};
use tracing::debug;

/// Sign every input `keys` can sign for, stopping at each input's
/// required count. Returns the number of signatures added.
pub fn sign_template(template: &mut Template, keys: &[Secp256k1KeyPair]) -> Result<usize> {
    if template
        .signing_instructions
        .iter()
        .any(|i| i.sig_hash.is_none())
    {
        template.compute_sig_hashes()?;
    }

    let mut added = 0;
    for (index, instruction) in template.signing_instructions.iter_mut().enumerate() {
        if instruction.is_issuance() || instruction.is_complete() {
            continue;
        }
        let digest = digest(instruction, index)?;
        for pubkey in &instruction.pubkeys {
            if instruction.signatures.len() >= instruction.required {
                break;
            }
            if signed_by(pubkey, &digest, &instruction.signatures) {
                continue;
            }
            if let Some(key) = keys.iter().find(|k| k.public_key() == *pubkey) {
                instruction.signatures.push(key.sign_digest(digest.as_bytes())?);
                added += 1;
            }
        }
    }
    debug!("[fc-06] Added {} signatures", added);
    Ok(added)
}

/// Attach a signature produced elsewhere to input `index`.
///
/// The signature must verify against one of the input's keys.
pub fn attach_signature(
    template: &mut Template,
    index: usize,
    signature: Secp256k1Signature,
) -> Result<()> {
    let instruction = template
        .signing_instructions
        .get_mut(index)
        .ok_or_else(|| BuildError::BadTemplate(format!("no input {index}")))?;
    let digest = digest(instruction, index)?;

    let matches_key = instruction
        .pubkeys
        .iter()
        .any(|pk| pk.verify_digest(digest.as_bytes(), &signature).is_ok());
    if !matches_key {
        return Err(BuildError::BadTemplate(format!(
            "signature for input {index} matches no key"
        )));
    }
    if !instruction.signatures.contains(&signature) {
        instruction.signatures.push(signature);
    }
    Ok(())
}

/// Turn a fully signed template into a transaction.
///
/// Signatures are ordered to follow the program's key order, which is
/// the order the predicate checks them in.
pub fn assemble_signatures(template: &Template) -> Result<Tx> {
    template.check_shape()?;
    let mut data = template.unsigned_tx.clone();

    for (index, (input, instruction)) in data
        .inputs
        .iter_mut()
        .zip(&template.signing_instructions)
        .enumerate()
    {
        input.signature_script = if instruction.is_issuance() {
            script::push_only(std::slice::from_ref(&instruction.issuance_program))
        } else if instruction.required == 0 {
            Vec::new()
        } else {
            let digest = digest(instruction, index)?;
            let pushes: Vec<Vec<u8>> = instruction
                .pubkeys
                .iter()
                .filter_map(|pk| {
                    instruction
                        .signatures
                        .iter()
                        .find(|sig| pk.verify_digest(digest.as_bytes(), sig).is_ok())
                })
                .take(instruction.required)
                .map(|sig| {
                    let mut push = sig.as_bytes().to_vec();
                    push.push(instruction.sig_hash_type.to_byte());
                    push
                })
                .collect();
            if pushes.len() < instruction.required {
                return Err(BuildError::MissingSignatures {
                    index,
                    required: instruction.required,
                    have: pushes.len(),
                });
            }
            script::push_only(&pushes)
        };
    }
    Ok(Tx::new(data))
}

fn digest(instruction: &SigningInstruction, index: usize) -> Result<Hash> {
    instruction
        .sig_hash
        .ok_or_else(|| BuildError::BadTemplate(format!("input {index} has no sig hash")))
}

fn signed_by(pubkey: &Secp256k1PublicKey, digest: &Hash, sigs: &[Secp256k1Signature]) -> bool {
    sigs.iter()
        .any(|sig| pubkey.verify_digest(digest.as_bytes(), sig).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::script::MultisigProgram;
    use shared_types::{AssetAmount, AssetId, Outpoint, TxInput, TxOutput};

    fn multisig_template(keys: &[Secp256k1KeyPair], required: usize) -> Template {
        let pubkeys = keys.iter().map(|k| k.public_key()).collect();
        let program = MultisigProgram::new(required, pubkeys).to_program().unwrap();
        let asset = AssetId(Hash([7; 32]));

        let mut t = Template::new(Hash([1; 32]));
        t.unsigned_tx.inputs.push(TxInput {
            previous: Outpoint::new(Hash([2; 32]), 0),
            ..TxInput::default()
        });
        t.unsigned_tx
            .outputs
            .push(TxOutput::new(asset, 10, vec![0x51]));
        t.signing_instructions
            .push(SigningInstruction::for_program(AssetAmount::new(asset, 10), &program).unwrap());
        t
    }

    #[test]
    fn test_sign_and_assemble() {
        let keys: Vec<_> = (0..3).map(|_| Secp256k1KeyPair::generate()).collect();
        let mut t = multisig_template(&keys, 2);

        assert_eq!(sign_template(&mut t, &keys).unwrap(), 2);
        assert!(t.is_signed());
        assert_eq!(sign_template(&mut t, &keys).unwrap(), 0);

        let tx = assemble_signatures(&t).unwrap();
        let pushes = script::parse_pushes(&tx.inputs[0].signature_script).unwrap();
        assert_eq!(pushes.len(), 2);
        assert!(pushes.iter().all(|p| p.len() == 65 && p[64] == 0x01));
    }

    #[test]
    fn test_partial_signing_reports_missing() {
        let keys: Vec<_> = (0..2).map(|_| Secp256k1KeyPair::generate()).collect();
        let mut t = multisig_template(&keys, 2);
        sign_template(&mut t, &keys[1..]).unwrap();

        match assemble_signatures(&t) {
            Err(BuildError::MissingSignatures {
                index: 0,
                required: 2,
                have: 1,
            }) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_out_of_order_signatures_are_sorted() {
        let keys: Vec<_> = (0..2).map(|_| Secp256k1KeyPair::generate()).collect();
        let mut t = multisig_template(&keys, 2);
        t.compute_sig_hashes().unwrap();
        let digest = t.signing_instructions[0].sig_hash.unwrap();

        let s1 = keys[1].sign_digest(digest.as_bytes()).unwrap();
        let s0 = keys[0].sign_digest(digest.as_bytes()).unwrap();
        attach_signature(&mut t, 0, s1).unwrap();
        attach_signature(&mut t, 0, s0).unwrap();
        attach_signature(&mut t, 0, s0).unwrap();
        assert_eq!(t.signing_instructions[0].signatures.len(), 2);

        let tx = assemble_signatures(&t).unwrap();
        let pushes = script::parse_pushes(&tx.inputs[0].signature_script).unwrap();
        assert_eq!(&pushes[0][..64], s0.as_bytes());
        assert_eq!(&pushes[1][..64], s1.as_bytes());
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let keys: Vec<_> = (0..2).map(|_| Secp256k1KeyPair::generate()).collect();
        let mut t = multisig_template(&keys, 1);
        t.compute_sig_hashes().unwrap();
        let digest = t.signing_instructions[0].sig_hash.unwrap();
        let stranger = Secp256k1KeyPair::generate();
        let sig = stranger.sign_digest(digest.as_bytes()).unwrap();

        assert!(matches!(
            attach_signature(&mut t, 0, sig),
            Err(BuildError::BadTemplate(_))
        ));
        assert!(attach_signature(&mut t, 5, sig).is_err());
    }

    #[test]
    fn test_issuance_and_true_inputs_need_no_keys() {
        let asset = AssetId::new(&[0x51], &Hash([1; 32]));
        let mut t = Template::new(Hash([1; 32]));
        t.unsigned_tx.inputs.push(TxInput {
            previous: Outpoint::new(Hash([1; 32]), shared_types::INVALID_OUTPUT_INDEX),
            ..TxInput::default()
        });
        t.unsigned_tx.outputs.push(TxOutput::new(asset, 4, vec![0x51]));
        t.signing_instructions.push(SigningInstruction::for_issuance(
            AssetAmount::new(asset, 4),
            vec![0x51],
        ));

        let tx = assemble_signatures(&t).unwrap();
        assert_eq!(
            script::parse_pushes(&tx.inputs[0].signature_script).unwrap(),
            vec![vec![0x51]]
        );
    }
}

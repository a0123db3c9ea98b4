use shared_crypto::{CryptoError, Secp256k1KeyPair, Secp256k1PublicKey, Secp256k1Signature};
use shared_types::Hash;

/// Count signatures that verify under `pubkeys` with CHECKMULTISIG ordering.
///
/// Signatures are matched against keys front to back; a key, once passed,
/// is never revisited, so signatures must appear in key order.
pub fn count_valid_signatures(
    pubkeys: &[Secp256k1PublicKey],
    sigs: &[(Secp256k1Signature, Hash)],
) -> usize {
    let mut keys = pubkeys.iter();
    let mut valid = 0;
    for (sig, digest) in sigs {
        for key in keys.by_ref() {
            if key.verify_digest(digest.as_bytes(), sig).is_ok() {
                valid += 1;
                break;
            }
        }
    }
    valid
}

/// Sign `digest` with the provided keys, in the order their public keys
/// appear in `pubkeys`, stopping once `required` signatures exist.
pub fn sign_multisig(
    pubkeys: &[Secp256k1PublicKey],
    required: usize,
    digest: &Hash,
    keys: &[Secp256k1KeyPair],
) -> Result<Vec<Secp256k1Signature>, CryptoError> {
    let mut sigs = Vec::with_capacity(required);
    for pubkey in pubkeys {
        if sigs.len() >= required {
            break;
        }
        if let Some(key) = keys.iter().find(|k| k.public_key() == *pubkey) {
            sigs.push(key.sign_digest(digest.as_bytes())?);
        }
    }
    Ok(sigs)
}

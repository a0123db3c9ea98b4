use super::errors::{BlockRejection, PredicateError};
use super::merkle::tx_root;
use super::multisig::count_valid_signatures;
use super::tx::{validate_and_apply_tx, TxParams};
use crate::ports::PredicateEngine;
use fc_02_state::{compose, AssetDefinitionPointer, MemView, Output, StateTree, ViewReader};
use shared_crypto::ecdsa::SIGNATURE_LEN;
use shared_crypto::{Secp256k1PublicKey, Secp256k1Signature};
use shared_types::script::{self, MultisigProgram};
use shared_types::{AssetId, Block, BlockHeader, Hash, Tx};
use std::collections::BTreeMap;

/// Chain-wide inputs to block validation.
#[derive(Clone, Copy)]
pub struct BlockParams<'a> {
    pub genesis_hash: Hash,
    pub engine: &'a dyn PredicateEngine,
    /// Keys whose signature on a block vouches for its transactions' predicates.
    pub trusted_signers: &'a [Secp256k1PublicKey],
}

/// Effects of a valid block.
#[derive(Debug, Clone)]
pub struct BlockDelta {
    /// Every output the block touched: new outputs and spent tombstones.
    pub outputs: Vec<Output>,
    /// Asset definition pointers the block changed.
    pub pointers: BTreeMap<AssetId, AssetDefinitionPointer>,
    /// State commitment after the block.
    pub state: StateTree,
    /// True if the trusted-signer fast path was taken.
    pub trusted: bool,
}

/// Check height, hash linkage and timestamp against the previous header.
pub fn validate_block_header(prev: &BlockHeader, header: &BlockHeader) -> Result<(), BlockRejection> {
    if header.height != prev.height + 1 {
        return Err(BlockRejection::BadHeight {
            expected: prev.height + 1,
            actual: header.height,
        });
    }
    let prev_hash = prev.hash();
    if header.previous_block_hash != prev_hash {
        return Err(BlockRejection::BadPreviousHash {
            expected: prev_hash,
            actual: header.previous_block_hash,
        });
    }
    if header.timestamp < prev.timestamp {
        return Err(BlockRejection::TimestampRegressed {
            previous: prev.timestamp,
            actual: header.timestamp,
        });
    }
    Ok(())
}

fn block_signatures(header: &BlockHeader) -> Result<Vec<Secp256k1Signature>, PredicateError> {
    script::parse_pushes(&header.signature_script)?
        .iter()
        .map(|push| {
            Secp256k1Signature::from_slice(push)
                .map_err(|_| PredicateError::MalformedSignature { len: push.len() })
        })
        .collect()
}

/// Check `header.signature_script` against the previous block's output script.
pub fn check_block_signature(
    prev_output_script: &[u8],
    header: &BlockHeader,
) -> Result<(), BlockRejection> {
    if script::is_true_program(prev_output_script) {
        return Ok(());
    }
    let program = MultisigProgram::parse(prev_output_script)
        .ok_or(BlockRejection::BadSignature(PredicateError::UnsupportedProgram))?;

    let digest = header.hash_for_sig();
    let sigs: Vec<_> = block_signatures(header)
        .map_err(BlockRejection::BadSignature)?
        .into_iter()
        .map(|sig| (sig, digest))
        .collect();

    let valid = count_valid_signatures(&program.pubkeys, &sigs);
    if valid < program.required {
        return Err(BlockRejection::BadSignature(
            PredicateError::NotEnoughSignatures {
                required: program.required,
                valid,
            },
        ));
    }
    Ok(())
}

/// True if any pushed signature verifies under a trusted key.
pub fn is_trusted_block(header: &BlockHeader, trusted_signers: &[Secp256k1PublicKey]) -> bool {
    if trusted_signers.is_empty() {
        return false;
    }
    let Ok(pushes) = script::parse_pushes(&header.signature_script) else {
        return false;
    };
    let digest = header.hash_for_sig();
    pushes
        .iter()
        .filter(|push| push.len() == SIGNATURE_LEN)
        .filter_map(|push| Secp256k1Signature::from_slice(push).ok())
        .any(|sig| {
            trusted_signers
                .iter()
                .any(|key| key.verify_digest(digest.as_bytes(), &sig).is_ok())
        })
}

/// Turn a validation overlay into block deltas, advancing `state` in place
/// to the next state tree.
pub fn commit_state(
    mut state: StateTree,
    overlay: MemView,
    txs: &[Tx],
) -> Result<BlockDelta, BlockRejection> {
    let (outputs, pointers) = overlay.into_parts();
    for output in &outputs {
        state.apply_output(output)?;
    }
    for pointer in pointers.values() {
        state.apply_pointer(pointer)?;
    }
    for tx in txs.iter().filter(|tx| tx.is_issuance()) {
        for output in &tx.outputs {
            state.add_issuance(output.asset_id, output.amount)?;
        }
    }
    Ok(BlockDelta {
        outputs,
        pointers,
        state,
        trusted: false,
    })
}

/// Fully validate `block` on top of `prev`.
///
/// `chain` must hold the confirmed outputs the block's transactions spend
/// and `state` the commitment as of `prev`. `state` is consumed into the
/// returned delta, which is what the caller persists.
pub fn validate_block<V: ViewReader>(
    chain: &V,
    state: StateTree,
    prev: &BlockHeader,
    block: &Block,
    params: &BlockParams<'_>,
) -> Result<BlockDelta, BlockRejection> {
    let header = &block.header;
    validate_block_header(prev, header)?;

    let hashes: Vec<Hash> = block.transactions.iter().map(Tx::hash).collect();
    let root = tx_root(&hashes);
    if root != header.tx_root {
        return Err(BlockRejection::BadTxRoot {
            expected: root,
            actual: header.tx_root,
        });
    }

    check_block_signature(&prev.output_script, header)?;
    let trusted = is_trusted_block(header, params.trusted_signers);

    let tx_params = TxParams {
        genesis_hash: params.genesis_hash,
        timestamp: header.timestamp,
        engine: params.engine,
        skip_predicates: trusted,
    };
    let mut view = compose(MemView::new(), vec![chain]);
    for (index, tx) in block.transactions.iter().enumerate() {
        validate_and_apply_tx(&mut view, tx, &tx_params).map_err(|reason| BlockRejection::Tx {
            index,
            hash: tx.hash(),
            reason,
        })?;
    }

    let mut delta = commit_state(state, view.into_overlay(), &block.transactions)?;
    let actual = delta.state.root_hash();
    if actual != header.state_root {
        return Err(BlockRejection::BadStateRoot {
            expected: actual,
            actual: header.state_root,
        });
    }
    delta.trusted = trusted;
    Ok(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StandardEngine;
    use crate::domain::multisig::sign_multisig;
    use crate::domain::tx::fixtures::*;
    use crate::domain::TxRejection;
    use shared_crypto::Secp256k1KeyPair;

    struct Setup {
        keys: Vec<Secp256k1KeyPair>,
        prev: BlockHeader,
        chain: MemView,
        state: StateTree,
        funds: Output,
    }

    fn setup() -> Setup {
        let keys: Vec<_> = (0..2).map(|_| Secp256k1KeyPair::generate()).collect();
        let program = MultisigProgram::new(2, keys.iter().map(|k| k.public_key()).collect())
            .to_program()
            .unwrap();
        let funds = unspent(1, asset(1), 10);
        let mut state = StateTree::new();
        state.apply_output(&funds).unwrap();
        let prev = BlockHeader {
            version: 1,
            height: 1,
            timestamp: 500,
            state_root: state.root_hash(),
            output_script: program,
            ..BlockHeader::default()
        };
        Setup {
            keys,
            chain: chain(&[funds.clone()]),
            state,
            prev,
            funds,
        }
    }

    fn build(s: &Setup, txs: Vec<Tx>, signers: &[Secp256k1KeyPair]) -> Block {
        let engine = StandardEngine::new();
        let params = TxParams::new(GENESIS, 1_000, &engine);
        let mut view = compose(MemView::new(), vec![&s.chain]);
        for tx in &txs {
            validate_and_apply_tx(&mut view, tx, &params).unwrap();
        }
        let delta = commit_state(s.state.clone(), view.into_overlay(), &txs).unwrap();
        let hashes: Vec<Hash> = txs.iter().map(Tx::hash).collect();
        let mut header = BlockHeader {
            version: 1,
            height: s.prev.height + 1,
            previous_block_hash: s.prev.hash(),
            tx_root: tx_root(&hashes),
            state_root: delta.state.root_hash(),
            timestamp: 1_000,
            signature_script: Vec::new(),
            output_script: s.prev.output_script.clone(),
        };
        let program = MultisigProgram::parse(&s.prev.output_script).unwrap();
        let sigs = sign_multisig(&program.pubkeys, program.required, &header.hash_for_sig(), signers)
            .unwrap();
        header.signature_script =
            script::push_only(&sigs.iter().map(|s| s.as_bytes().to_vec()).collect::<Vec<_>>());
        Block {
            header,
            transactions: txs,
        }
    }

    fn params<'a>(engine: &'a StandardEngine, trusted: &'a [Secp256k1PublicKey]) -> BlockParams<'a> {
        BlockParams {
            genesis_hash: GENESIS,
            engine,
            trusted_signers: trusted,
        }
    }

    #[test]
    fn test_valid_block() {
        let s = setup();
        let tx = spend(&[&s.funds], &[(asset(1), 4), (asset(1), 6)]);
        let block = build(&s, vec![tx.clone()], &s.keys);
        let engine = StandardEngine::new();

        let delta = validate_block(&s.chain, s.state.clone(), &s.prev, &block, &params(&engine, &[])).unwrap();
        assert!(!delta.trusted);
        assert_eq!(delta.outputs.len(), 3);
        assert!(delta.outputs.iter().any(|o| o.outpoint == s.funds.outpoint && o.spent));
        assert_eq!(delta.state.root_hash(), block.header.state_root);
    }

    #[test]
    fn test_header_checks() {
        let s = setup();
        let mut next = BlockHeader {
            height: 3,
            previous_block_hash: s.prev.hash(),
            timestamp: 600,
            ..BlockHeader::default()
        };
        assert_eq!(
            validate_block_header(&s.prev, &next),
            Err(BlockRejection::BadHeight {
                expected: 2,
                actual: 3
            })
        );
        next.height = 2;
        next.timestamp = 499;
        assert_eq!(
            validate_block_header(&s.prev, &next),
            Err(BlockRejection::TimestampRegressed {
                previous: 500,
                actual: 499
            })
        );
        next.timestamp = 500;
        assert!(validate_block_header(&s.prev, &next).is_ok());
        next.previous_block_hash = Hash([9; 32]);
        assert!(matches!(
            validate_block_header(&s.prev, &next),
            Err(BlockRejection::BadPreviousHash { .. })
        ));
    }

    #[test]
    fn test_tx_root_mismatch() {
        let s = setup();
        let tx = spend(&[&s.funds], &[(asset(1), 10)]);
        let mut block = build(&s, vec![tx], &s.keys);
        block.header.tx_root = Hash([1; 32]);
        let engine = StandardEngine::new();
        assert!(matches!(
            validate_block(&s.chain, s.state.clone(), &s.prev, &block, &params(&engine, &[])),
            Err(BlockRejection::BadTxRoot { .. })
        ));
    }

    #[test]
    fn test_insufficient_block_signatures() {
        let s = setup();
        let block = build(&s, vec![], &s.keys[..1]);
        let engine = StandardEngine::new();
        assert_eq!(
            validate_block(&s.chain, s.state.clone(), &s.prev, &block, &params(&engine, &[])).unwrap_err(),
            BlockRejection::BadSignature(PredicateError::NotEnoughSignatures {
                required: 2,
                valid: 1
            })
        );
    }

    #[test]
    fn test_one_bad_tx_rejects_block() {
        let s = setup();
        let good = spend(&[&s.funds], &[(asset(1), 10)]);
        let mut block = build(&s, vec![good.clone()], &s.keys);
        let double = spend(&[&s.funds], &[(asset(1), 10)]);
        let mut data = double.into_data();
        data.metadata = b"again".to_vec();
        block.transactions.push(Tx::new(data));
        let hashes: Vec<Hash> = block.transactions.iter().map(Tx::hash).collect();
        block.header.tx_root = tx_root(&hashes);
        // Re-sign the modified header.
        let program = MultisigProgram::parse(&s.prev.output_script).unwrap();
        let sigs = sign_multisig(&program.pubkeys, 2, &block.header.hash_for_sig(), &s.keys).unwrap();
        block.header.signature_script =
            script::push_only(&sigs.iter().map(|s| s.as_bytes().to_vec()).collect::<Vec<_>>());

        let engine = StandardEngine::new();
        match validate_block(&s.chain, s.state.clone(), &s.prev, &block, &params(&engine, &[])) {
            Err(BlockRejection::Tx { index, reason, .. }) => {
                assert_eq!(index, 1);
                assert!(matches!(reason, TxRejection::InputSpent { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_state_root_mismatch() {
        let s = setup();
        let tx = spend(&[&s.funds], &[(asset(1), 10)]);
        let mut block = build(&s, vec![tx], &s.keys);
        block.header.state_root = Hash([3; 32]);
        let program = MultisigProgram::parse(&s.prev.output_script).unwrap();
        let sigs = sign_multisig(&program.pubkeys, 2, &block.header.hash_for_sig(), &s.keys).unwrap();
        block.header.signature_script =
            script::push_only(&sigs.iter().map(|s| s.as_bytes().to_vec()).collect::<Vec<_>>());
        let engine = StandardEngine::new();
        assert!(matches!(
            validate_block(&s.chain, s.state.clone(), &s.prev, &block, &params(&engine, &[])),
            Err(BlockRejection::BadStateRoot { .. })
        ));
    }

    #[test]
    fn test_trusted_signer_skips_predicates() {
        let mut s = setup();
        // An output no engine can satisfy.
        s.funds.output.script = vec![0xff];
        s.chain = chain(&[s.funds.clone()]);
        s.state = StateTree::new();
        s.state.apply_output(&s.funds).unwrap();
        s.prev.state_root = s.state.root_hash();

        let tx = spend(&[&s.funds], &[(asset(1), 10)]);
        let engine = StandardEngine::new();

        // Build the block by hand: the builder helper runs predicates.
        let mut view = compose(MemView::new(), vec![&s.chain]);
        let mut tx_params = TxParams::new(GENESIS, 1_000, &engine);
        tx_params.skip_predicates = true;
        validate_and_apply_tx(&mut view, &tx, &tx_params).unwrap();
        let delta = commit_state(s.state.clone(), view.into_overlay(), &[tx.clone()]).unwrap();
        let mut header = BlockHeader {
            version: 1,
            height: 2,
            previous_block_hash: s.prev.hash(),
            tx_root: tx_root(&[tx.hash()]),
            state_root: delta.state.root_hash(),
            timestamp: 1_000,
            signature_script: Vec::new(),
            output_script: s.prev.output_script.clone(),
        };
        let program = MultisigProgram::parse(&s.prev.output_script).unwrap();
        let sigs = sign_multisig(&program.pubkeys, 2, &header.hash_for_sig(), &s.keys).unwrap();
        header.signature_script =
            script::push_only(&sigs.iter().map(|s| s.as_bytes().to_vec()).collect::<Vec<_>>());
        let block = Block {
            header,
            transactions: vec![tx],
        };

        assert!(matches!(
            validate_block(&s.chain, s.state.clone(), &s.prev, &block, &params(&engine, &[])),
            Err(BlockRejection::Tx {
                reason: TxRejection::Predicate { .. },
                ..
            })
        ));

        let trusted = [s.keys[0].public_key()];
        let delta = validate_block(&s.chain, s.state.clone(), &s.prev, &block, &params(&engine, &trusted)).unwrap();
        assert!(delta.trusted);
    }

    #[test]
    fn test_commit_state_advances_given_tree() {
        let s = setup();
        let before = s.state.root_hash();
        let unchanged = commit_state(s.state.clone(), MemView::new(), &[]).unwrap();
        assert_eq!(unchanged.state.root_hash(), before);

        let spent = MemView::from_parts([s.funds.clone().into_spent()], []);
        let delta = commit_state(s.state.clone(), spent, &[]).unwrap();
        assert_eq!(delta.state.root_hash(), StateTree::new().root_hash());
        assert_eq!(s.state.root_hash(), before);
    }

    #[test]
    fn test_issuance_updates_circulation() {
        let s = setup();
        let tx = issuance(&TRUE, 100, b"", 0);
        let block = build(&s, vec![tx], &s.keys);
        let engine = StandardEngine::new();
        let delta = validate_block(&s.chain, s.state.clone(), &s.prev, &block, &params(&engine, &[])).unwrap();
        assert_eq!(delta.state.circulation(&AssetId::new(&TRUE, &GENESIS)), 100);
    }
}

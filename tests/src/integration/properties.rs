//! # Ledger Properties
//!
//! Properties that span the codec, state views and validation:
//!
//! - non-issuance transactions are accepted only when every asset balances
//! - a second spend of an output fails once the first is applied
//! - transaction hashes survive a wire round trip and track content

#[cfg(test)]
mod tests {
    use fc_02_state::{AssetDefinitionPointer, MemView, Output};
    use fc_03_validation::{
        validate_and_apply_tx, validate_tx, StandardEngine, TxParams, TxRejection,
    };
    use proptest::prelude::*;
    use shared_types::script::OP_TRUE;
    use shared_types::{AssetId, Hash, Outpoint, Tx, TxData, TxInput, TxOutput};

    const GENESIS: Hash = Hash([0x42; 32]);

    fn asset() -> AssetId {
        AssetId::new(&[OP_TRUE], &GENESIS)
    }

    fn funded_view(amounts: &[u64]) -> (MemView, Vec<Outpoint>) {
        let outputs: Vec<Output> = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                Output::new(
                    Outpoint::new(Hash([7; 32]), i as u32),
                    TxOutput::new(asset(), *amount, vec![OP_TRUE]),
                )
            })
            .collect();
        let outpoints = outputs.iter().map(|o| o.outpoint).collect();
        (MemView::from_parts(outputs, Vec::<AssetDefinitionPointer>::new()), outpoints)
    }

    fn spend(inputs: &[Outpoint], amounts: &[u64], metadata: Vec<u8>) -> Tx {
        Tx::new(TxData {
            inputs: inputs
                .iter()
                .map(|previous| TxInput {
                    previous: *previous,
                    ..TxInput::default()
                })
                .collect(),
            outputs: amounts
                .iter()
                .map(|amount| TxOutput::new(asset(), *amount, vec![OP_TRUE]))
                .collect(),
            metadata,
            ..TxData::default()
        })
    }

    proptest! {
        #[test]
        fn prop_only_balanced_spends_validate(
            outputs in proptest::collection::vec(1u64..1_000_000, 1..6),
            split in 1usize..4,
            extra in 0u64..3,
        ) {
            let total: u64 = outputs.iter().sum::<u64>() + extra;
            let mut inputs = vec![total / split as u64; split];
            inputs[0] += total % split as u64;
            let inputs: Vec<u64> = inputs.into_iter().filter(|a| *a > 0).collect();

            let (view, outpoints) = funded_view(&inputs);
            let tx = spend(&outpoints, &outputs, Vec::new());
            let engine = StandardEngine::new();
            let result = validate_tx(&view, &tx, &TxParams::new(GENESIS, 0, &engine));

            if extra == 0 {
                prop_assert!(result.is_ok(), "{:?}", result);
            } else {
                let unbalanced = matches!(result, Err(TxRejection::Unbalanced { .. }));
                prop_assert!(unbalanced);
            }
        }

        #[test]
        fn prop_second_spend_fails(amount in 1u64..u64::MAX / 2, first_meta in any::<u8>()) {
            let (mut view, outpoints) = funded_view(&[amount]);
            let engine = StandardEngine::new();
            let params = TxParams::new(GENESIS, 0, &engine);

            let t1 = spend(&outpoints, &[amount], vec![first_meta]);
            let t2 = spend(&outpoints, &[amount], vec![first_meta.wrapping_add(1)]);
            prop_assert_ne!(t1.hash(), t2.hash());

            validate_and_apply_tx(&mut view, &t1, &params).unwrap();
            let second = validate_tx(&view, &t2, &params);
            let spent = matches!(second, Err(TxRejection::InputSpent { index: 0, .. }));
            prop_assert!(spent);
        }

        #[test]
        fn prop_hash_survives_wire_round_trip(
            amounts in proptest::collection::vec(1u64..u64::MAX, 1..4),
            metadata in proptest::collection::vec(any::<u8>(), 0..64),
            lock_time in any::<u64>(),
        ) {
            let mut tx = spend(&[Outpoint::new(Hash([1; 32]), 3)], &amounts, metadata).into_data();
            tx.lock_time = lock_time;
            let tx = Tx::new(tx);

            let decoded = Tx::from_bytes(&tx.to_bytes()).unwrap();
            prop_assert_eq!(decoded.hash(), tx.hash());
            prop_assert_eq!(tx.clone().hash(), tx.hash());

            let mut changed = tx.into_data();
            let before = Tx::new(changed.clone()).hash();
            changed.lock_time = changed.lock_time.wrapping_add(1);
            prop_assert_ne!(Tx::new(changed).hash(), before);
        }
    }
}

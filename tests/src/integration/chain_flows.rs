//! # Chain Flows
//!
//! End-to-end flows through builder, pool, block production and listeners:
//!
//! 1. Genesis then a single issuance lands in the issuer's account
//! 2. A second spend of a pooled output is rejected before it confirms
//! 3. A block from another node evicts a pooled tx spending the same output

#[cfg(test)]
mod tests {
    use crate::integration::harness::{account, federation, node};
    use fc_03_validation::TxRejection;
    use fc_04_chain::{ChainError, Store, TxStatus};
    use fc_05_utxodb::{ReserveError, Source as AccountSource, UtxoStore};
    use fc_06_txbuilder::{assemble_signatures, BuildError, Source};

    #[tokio::test]
    async fn test_genesis_and_single_issuance() {
        let node = node(&federation(1)).await;
        assert_eq!(node.ledger.chain.height(), 1);

        let x = account("x");
        node.track(&x);
        let tx = node.issue(&x, 100).await;
        assert_eq!(node.ledger.store.pool_len(), 1);

        let block = node.mine().await;
        assert_eq!(block.height(), 2);
        assert_eq!(block.transactions, vec![tx.clone()]);

        let utxos = node
            .ledger
            .accounts
            .unspent_utxos(&AccountSource::new(node.asset(), "x"))
            .await
            .unwrap();
        assert_eq!(utxos.len(), 1);
        assert_eq!(utxos[0].amount, 100);
        assert_eq!(utxos[0].outpoint, tx.outpoint(0));

        assert_eq!(node.ledger.store.pool_len(), 0);
        assert_eq!(
            node.ledger.store.tx_status(&tx.hash()).await.unwrap(),
            Some(TxStatus::Confirmed)
        );
        let output = node.ledger.store.output(&tx.outpoint(0)).unwrap();
        assert!(!output.spent);
    }

    #[tokio::test]
    async fn test_reserved_output_double_spend_rejected() {
        let node = node(&federation(3)).await;
        let (x, y, z) = (account("x"), account("y"), account("z"));
        node.track(&x);
        let issued = node.issue(&x, 10).await;
        node.mine().await;
        let u = issued.outpoint(0);

        let t1 = node.pay_from_utxo(&x, u, 10, &y).await;
        node.ledger
            .builder
            .submit(&node.ledger.chain, &t1)
            .await
            .unwrap();

        // The reserver will not hand out U again.
        let err = node
            .ledger
            .builder
            .build(
                &[Source::Utxo {
                    outpoint: u,
                    client_token: None,
                }],
                &[],
                Vec::new(),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Reserve(ReserveError::Reserved { .. })));

        // A second spend assembled behind the reserver's back is refused by
        // the pool.
        node.ledger.builder.cancel(&t1).await;
        let t2 = node.pay_from_utxo(&x, u, 10, &z).await;
        let err = node
            .ledger
            .chain
            .add_tx(assemble_signatures(&t2).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChainError::TxRejected(TxRejection::InputSpent { .. })
        ));

        // U is still unspent on chain until T1 confirms.
        assert!(!node.ledger.store.output(&u).unwrap().spent);
        assert_eq!(node.ledger.store.pool_len(), 1);
    }

    #[tokio::test]
    async fn test_block_landing_conflicts_pending_tx() {
        let keys = federation(2);
        let a = node(&keys).await;
        let b = node(&keys).await;
        assert_eq!(a.ledger.builder.chain_id(), b.ledger.builder.chain_id());

        let (x, y, z) = (account("x"), account("y"), account("z"));
        a.track(&x);
        b.track(&x);

        let issued = a.issue(&x, 10).await;
        let block = a.mine().await;
        assert!(b.ledger.chain.add_block(block).await.unwrap().is_empty());
        let u = issued.outpoint(0);

        let t1 = a.pay_from_utxo(&x, u, 10, &y).await;
        let t1 = a.ledger.builder.submit(&a.ledger.chain, &t1).await.unwrap();
        let t2 = b.pay_from_utxo(&x, u, 10, &z).await;
        let t2 = b.ledger.builder.submit(&b.ledger.chain, &t2).await.unwrap();
        assert_ne!(t1.hash(), t2.hash());

        let block = a.mine().await;
        assert_eq!(block.transactions, vec![t1.clone()]);

        let conflicts = b.ledger.chain.add_block(block).await.unwrap();
        assert_eq!(conflicts, vec![t2.clone()]);
        assert_eq!(b.ledger.store.pool_len(), 0);
        assert_eq!(b.ledger.store.tx_status(&t2.hash()).await.unwrap(), None);
        assert_eq!(
            b.ledger.store.tx_status(&t1.hash()).await.unwrap(),
            Some(TxStatus::Confirmed)
        );
        assert!(b.ledger.store.output(&u).unwrap().spent);
    }

    #[tokio::test]
    async fn test_confirmed_tx_resubmission_is_a_no_op() {
        let node = node(&federation(1)).await;
        let x = account("x");
        let tx = node.issue(&x, 5).await;
        node.mine().await;

        node.ledger.chain.add_tx(tx.clone()).await.unwrap();
        assert_eq!(node.ledger.store.pool_len(), 0);
        assert_eq!(node.ledger.chain.height(), 2);
    }
}

//! # Reservation Flows
//!
//! Reservations over outputs that were actually issued and confirmed:
//! concurrent callers never share a UTXO, client tokens return the same
//! reservation, and expired reservations free their outputs.

#[cfg(test)]
mod tests {
    use crate::integration::harness::{account, federation, node, Account, Node};
    use fc_04_chain::TimeSource;
    use fc_05_utxodb::{
        InMemoryReservationTable, ReserveError, Source, TableReserver, UtxoReserver, UtxoStore,
    };
    use std::collections::HashSet;
    use std::sync::Arc;

    /// A node where account `x` holds `count` confirmed outputs of 10.
    async fn funded(count: usize) -> (Node, Source, Account) {
        let node = node(&federation(1)).await;
        let x = account("x");
        node.track(&x);
        for _ in 0..count {
            node.issue(&x, 10).await;
        }
        node.mine().await;
        let source = Source::new(node.asset(), "x");
        assert_eq!(node.ledger.accounts.balance(&source), 10 * count as u128);
        (node, source, x)
    }

    async fn race(
        reserver: Arc<dyn UtxoReserver>,
        source: &Source,
        callers: usize,
        amount: u64,
        expiry: u64,
    ) -> (usize, HashSet<shared_types::Outpoint>) {
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let reserver = reserver.clone();
                let source = source.clone();
                tokio::spawn(async move { reserver.reserve(&source, amount, None, expiry).await })
            })
            .collect();

        let mut held = HashSet::new();
        let mut wins = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(reservation) => {
                    wins += 1;
                    for utxo in &reservation.utxos {
                        assert!(held.insert(utxo.outpoint), "utxo reserved twice");
                    }
                }
                Err(ReserveError::Reserved { .. }) => {}
                Err(e) => panic!("unexpected error {e}"),
            }
        }
        (wins, held)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reservations_exclude_each_other() {
        let (node, source, _) = funded(5).await;
        let expiry = node.time.now() + 60_000;

        let (wins, held) = race(node.ledger.reserver.clone(), &source, 8, 15, expiry).await;
        assert_eq!(wins, 2);
        assert_eq!(held.len(), 4);
        assert_eq!(node.ledger.reserver.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_table_reservers_exclude_each_other() {
        let (node, source, _) = funded(4).await;
        let table = Arc::new(InMemoryReservationTable::new(node.ledger.accounts.clone()));
        let a: Arc<dyn UtxoReserver> = Arc::new(TableReserver::new(table.clone(), node.time.clone()));
        let b: Arc<dyn UtxoReserver> = Arc::new(TableReserver::new(table.clone(), node.time.clone()));
        let expiry = node.time.now() + 60_000;

        let (wins_a, held_a) = race(a, &source, 3, 10, expiry).await;
        let (wins_b, held_b) = race(b, &source, 3, 10, expiry).await;
        assert_eq!(wins_a + wins_b, 4);
        assert!(held_a.is_disjoint(&held_b));
        assert_eq!(table.len().await, 4);
    }

    #[tokio::test]
    async fn test_client_token_returns_same_reservation() {
        let (node, source, _) = funded(3).await;
        let reserver = &node.ledger.reserver;
        let expiry = node.time.now() + 60_000;

        let first = reserver
            .reserve(&source, 12, Some("order-7"), expiry)
            .await
            .unwrap();
        let second = reserver
            .reserve(&source, 12, Some("order-7"), expiry)
            .await
            .unwrap();
        assert_eq!(*first, *second);
        assert_eq!(first.change, 8);
        assert_eq!(reserver.len(), 1);

        let other = reserver
            .reserve(&source, 5, Some("order-8"), expiry)
            .await
            .unwrap();
        assert_ne!(other.id, first.id);
    }

    #[tokio::test]
    async fn test_expired_reservation_frees_outputs() {
        let (node, source, _) = funded(1).await;
        let reserver = &node.ledger.reserver;
        let expiry = node.time.now() + 500;

        reserver.reserve(&source, 10, None, expiry).await.unwrap();
        assert!(matches!(
            reserver.reserve(&source, 10, None, expiry).await,
            Err(ReserveError::Reserved { requested: 10, unreserved: 0 })
        ));
        assert!(matches!(
            reserver.reserve(&source, 11, None, expiry).await,
            Err(ReserveError::Insufficient { requested: 11, available: 10 })
        ));

        node.time.advance(500);
        assert_eq!(reserver.expire_reservations().await.unwrap(), 1);
        assert!(reserver.is_empty());
        assert!(reserver.reserve(&source, 10, None, expiry + 500).await.is_ok());
    }

    /// Retry a token after its reservation expired but before any sweep.
    ///
    /// Returns the ids of the original, the renewed and the repeated
    /// reservation, and the outcome of two untokened requests afterwards.
    async fn retry_after_expiry(
        reserver: &dyn UtxoReserver,
        node: &Node,
        source: &Source,
    ) -> (u64, u64, u64, bool, bool) {
        let first = reserver
            .reserve(source, 10, Some("order-9"), node.time.now() + 500)
            .await
            .unwrap();
        node.time.advance(500);

        let expiry = node.time.now() + 60_000;
        let renewed = reserver
            .reserve(source, 10, Some("order-9"), expiry)
            .await
            .unwrap();
        assert!(!renewed.is_expired(node.time.now()));
        assert_eq!(reserver.expire_reservations().await.unwrap(), 0);
        let repeated = reserver
            .reserve(source, 10, Some("order-9"), expiry)
            .await
            .unwrap();

        let spare = reserver.reserve(source, 10, None, expiry).await.is_ok();
        let exhausted = matches!(
            reserver.reserve(source, 10, None, expiry).await,
            Err(ReserveError::Reserved { .. })
        );
        (first.id, renewed.id, repeated.id, spare, exhausted)
    }

    #[tokio::test]
    async fn test_reservers_agree_on_token_retry_after_expiry() {
        let (node, source, _) = funded(2).await;
        let (first, renewed, repeated, spare, exhausted) =
            retry_after_expiry(node.ledger.reserver.as_ref(), &node, &source).await;
        assert_ne!(first, renewed);
        assert_eq!(renewed, repeated);
        assert!(spare && exhausted);
        assert_eq!(node.ledger.reserver.len(), 2);

        let (node, source, _) = funded(2).await;
        let table = Arc::new(InMemoryReservationTable::new(node.ledger.accounts.clone()));
        let reserver = TableReserver::new(table.clone(), node.time.clone());
        let (first, renewed, repeated, spare, exhausted) =
            retry_after_expiry(&reserver, &node, &source).await;
        assert_ne!(first, renewed);
        assert_eq!(renewed, repeated);
        assert!(spare && exhausted);
        assert_eq!(table.len().await, 2);
    }

    #[tokio::test]
    async fn test_spent_outputs_leave_the_account() {
        let (node, source, x) = funded(2).await;
        let y = account("y");
        node.track(&y);
        let utxos = node.ledger.accounts.unspent_utxos(&source).await.unwrap();

        let template = node.pay_from_utxo(&x, utxos[0].outpoint, 10, &y).await;
        node.ledger
            .builder
            .submit(&node.ledger.chain, &template)
            .await
            .unwrap();
        node.mine().await;

        assert_eq!(node.ledger.accounts.balance(&source), 10);
        let to_y = Source::new(node.asset(), "y");
        assert_eq!(node.ledger.accounts.balance(&to_y), 10);

        // Only the untouched output is left to reserve.
        let expiry = node.time.now() + 60_000;
        let reservation = node
            .ledger
            .reserver
            .reserve(&source, 10, None, expiry)
            .await
            .unwrap();
        assert_eq!(reservation.utxos.len(), 1);
        assert_eq!(reservation.utxos[0].outpoint, utxos[1].outpoint);
    }
}

//! In-memory `ReservationTable`

use crate::domain::{select_utxos, Reservation, ReservationId};
use crate::error::{ReserveError, Result};
use crate::ports::{ReservationTable, ReserveRequest, UtxoStore};
use async_trait::async_trait;
use shared_types::{Outpoint, Timestamp};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Table {
    next_id: ReservationId,
    reservations: BTreeMap<ReservationId, Reservation>,
    reserved: HashMap<Outpoint, ReservationId>,
    tokens: HashMap<String, ReservationId>,
}

impl Table {
    /// Live reservation held by `token`. An expired one is deleted.
    fn by_token(&mut self, token: Option<&str>, now: Timestamp) -> Option<Reservation> {
        let id = *self.tokens.get(token?)?;
        let reservation = self.reservations.get(&id)?;
        if !reservation.is_expired(now) {
            return Some(reservation.clone());
        }
        self.delete(id);
        None
    }

    fn insert(&mut self, mut reservation: Reservation) -> Reservation {
        self.next_id += 1;
        reservation.id = self.next_id;
        for utxo in &reservation.utxos {
            self.reserved.insert(utxo.outpoint, reservation.id);
        }
        if let Some(token) = &reservation.client_token {
            self.tokens.insert(token.clone(), reservation.id);
        }
        self.reservations.insert(reservation.id, reservation.clone());
        reservation
    }

    fn delete(&mut self, id: ReservationId) -> Option<Reservation> {
        let reservation = self.reservations.remove(&id)?;
        for utxo in &reservation.utxos {
            if self.reserved.get(&utxo.outpoint) == Some(&id) {
                self.reserved.remove(&utxo.outpoint);
            }
        }
        if let Some(token) = &reservation.client_token {
            if self.tokens.get(token) == Some(&id) {
                self.tokens.remove(token);
            }
        }
        Some(reservation)
    }
}

/// Reservation table kept in memory.
///
/// The whole table is locked for the duration of each procedure,
/// including the candidate fetch from the UTXO store.
pub struct InMemoryReservationTable {
    utxos: Arc<dyn UtxoStore>,
    table: Mutex<Table>,
}

impl InMemoryReservationTable {
    pub fn new(utxos: Arc<dyn UtxoStore>) -> Self {
        Self {
            utxos,
            table: Mutex::new(Table::default()),
        }
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.reservations.len()
    }
}

#[async_trait]
impl ReservationTable for InMemoryReservationTable {
    async fn reserve_utxos(&self, request: ReserveRequest) -> Result<Reservation> {
        let mut table = self.table.lock().await;
        if let Some(existing) = table.by_token(request.client_token.as_deref(), request.now) {
            return Ok(existing);
        }

        let candidates = self.utxos.unspent_utxos(&request.source).await?;
        let selection = select_utxos(&candidates, request.amount, |op| {
            table.reserved.contains_key(op)
        })?;
        Ok(table.insert(Reservation {
            id: 0,
            source: request.source,
            utxos: selection.utxos,
            change: selection.change,
            expiry: request.expiry,
            client_token: request.client_token,
        }))
    }

    async fn reserve_outpoint(
        &self,
        outpoint: &Outpoint,
        client_token: Option<String>,
        now: Timestamp,
        expiry: Timestamp,
    ) -> Result<Reservation> {
        let mut table = self.table.lock().await;
        if let Some(existing) = table.by_token(client_token.as_deref(), now) {
            return Ok(existing);
        }

        let utxo = self
            .utxos
            .utxo(outpoint)
            .await?
            .ok_or(ReserveError::UtxoNotFound(*outpoint))?;
        if table.reserved.contains_key(outpoint) {
            return Err(ReserveError::Reserved {
                requested: utxo.amount,
                unreserved: 0,
            });
        }
        Ok(table.insert(Reservation {
            id: 0,
            source: utxo.source(),
            utxos: vec![utxo],
            change: 0,
            expiry,
            client_token,
        }))
    }

    async fn cancel(&self, id: ReservationId) -> Result<Option<Reservation>> {
        Ok(self.table.lock().await.delete(id))
    }

    async fn expire(&self, now: Timestamp) -> Result<Vec<Reservation>> {
        let mut table = self.table.lock().await;
        let due: Vec<ReservationId> = table
            .reservations
            .values()
            .filter(|r| r.is_expired(now))
            .map(|r| r.id)
            .collect();
        Ok(due.into_iter().filter_map(|id| table.delete(id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::AccountUtxoIndex;
    use crate::domain::{Source, Utxo};
    use shared_types::{AssetId, Hash};

    fn source() -> Source {
        Source::new(AssetId(Hash([4; 32])), "carol")
    }

    fn setup(amounts: &[u64]) -> InMemoryReservationTable {
        let index = Arc::new(AccountUtxoIndex::new());
        for (i, amount) in amounts.iter().enumerate() {
            index.insert_utxo(Utxo {
                outpoint: Outpoint::new(Hash([i as u8 + 1; 32]), 0),
                asset_id: AssetId(Hash([4; 32])),
                amount: *amount,
                control_program: vec![0x51],
                account_id: "carol".into(),
                derivation_index: 0,
            });
        }
        InMemoryReservationTable::new(index)
    }

    fn request(token: &str, now: Timestamp, expiry: Timestamp) -> ReserveRequest {
        ReserveRequest {
            source: source(),
            amount: 5,
            client_token: Some(token.into()),
            now,
            expiry,
        }
    }

    #[tokio::test]
    async fn test_expired_token_row_is_replaced() {
        let table = setup(&[5]);
        let first = table.reserve_utxos(request("tok", 1_000, 1_500)).await.unwrap();
        let again = table.reserve_utxos(request("tok", 1_200, 9_000)).await.unwrap();
        assert_eq!(again, first);

        let fresh = table.reserve_utxos(request("tok", 1_500, 5_000)).await.unwrap();
        assert_ne!(fresh.id, first.id);
        assert_eq!(fresh.expiry, 5_000);
        assert_eq!(fresh.utxos, first.utxos);
        assert_eq!(table.len().await, 1);

        // The stale row is already gone, so the sweep finds nothing.
        assert!(table.expire(1_600).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_token_row_is_replaced_for_outpoint() {
        let table = setup(&[5]);
        let outpoint = Outpoint::new(Hash([1; 32]), 0);
        let first = table
            .reserve_outpoint(&outpoint, Some("tok".into()), 1_000, 1_500)
            .await
            .unwrap();
        let fresh = table
            .reserve_outpoint(&outpoint, Some("tok".into()), 1_500, 5_000)
            .await
            .unwrap();
        assert_ne!(fresh.id, first.id);
        assert!(!fresh.is_expired(1_500));
        assert_eq!(table.len().await, 1);
    }
}

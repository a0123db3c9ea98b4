//! Reserver backed by a shared `ReservationTable`

use crate::domain::{IdempotencyGroup, Reservation, ReservationId, Source};
use crate::error::Result;
use crate::ports::{ReservationTable, ReserveRequest, UtxoReserver};
use async_trait::async_trait;
use fc_04_chain::TimeSource;
use shared_types::{Outpoint, Timestamp};
use std::sync::Arc;
use tracing::{debug, info};

/// Reserver whose state lives in a table that other processes may share.
///
/// Token deduplication happens twice: locally so concurrent retries in this
/// process wait for one call, and inside the table so retries arriving at
/// another process find the same reservation.
pub struct TableReserver {
    table: Arc<dyn ReservationTable>,
    time: Arc<dyn TimeSource>,
    idempotency: IdempotencyGroup<Arc<Reservation>>,
}

impl TableReserver {
    pub fn new(table: Arc<dyn ReservationTable>, time: Arc<dyn TimeSource>) -> Self {
        Self {
            table,
            time,
            idempotency: IdempotencyGroup::new(),
        }
    }

    fn forget(&self, reservation: &Reservation) {
        if let Some(token) = &reservation.client_token {
            self.idempotency
                .forget_if(token, |remembered| remembered.id == reservation.id);
        }
    }

    async fn dedupe<F, Fut>(
        &self,
        client_token: Option<&str>,
        attempt: F,
    ) -> Result<Arc<Reservation>>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<Reservation>>,
    {
        let attempt = &attempt;
        let run = move || async move { attempt().await.map(Arc::new) };
        let Some(token) = client_token else {
            return run().await;
        };
        let reservation = self.idempotency.run(token, &run).await?;
        if !reservation.is_expired(self.time.now()) {
            return Ok(reservation);
        }
        // The table drops the expired row itself when the token comes back.
        self.forget(&reservation);
        self.idempotency.run(token, &run).await
    }
}

#[async_trait]
impl UtxoReserver for TableReserver {
    async fn reserve(
        &self,
        source: &Source,
        amount: u64,
        client_token: Option<&str>,
        expiry: Timestamp,
    ) -> Result<Arc<Reservation>> {
        let reservation = self
            .dedupe(client_token, || {
                self.table.reserve_utxos(ReserveRequest {
                    source: source.clone(),
                    amount,
                    client_token: client_token.map(str::to_owned),
                    now: self.time.now(),
                    expiry,
                })
            })
            .await?;
        debug!(
            "[fc-05] Table reservation {} holds {} UTXOs",
            reservation.id,
            reservation.utxos.len()
        );
        Ok(reservation)
    }

    async fn reserve_utxo(
        &self,
        outpoint: &Outpoint,
        client_token: Option<&str>,
        expiry: Timestamp,
    ) -> Result<Arc<Reservation>> {
        self.dedupe(client_token, || {
            self.table
                .reserve_outpoint(
                    outpoint,
                    client_token.map(str::to_owned),
                    self.time.now(),
                    expiry,
                )
        })
        .await
    }

    async fn cancel(&self, id: ReservationId) -> Result<()> {
        if let Some(reservation) = self.table.cancel(id).await? {
            self.forget(&reservation);
            debug!("[fc-05] Canceled table reservation {}", id);
        }
        Ok(())
    }

    async fn expire_reservations(&self) -> Result<usize> {
        let expired = self.table.expire(self.time.now()).await?;
        for reservation in &expired {
            self.forget(reservation);
        }
        if !expired.is_empty() {
            info!("[fc-05] Expired {} table reservations", expired.len());
        }
        Ok(expired.len())
    }
}

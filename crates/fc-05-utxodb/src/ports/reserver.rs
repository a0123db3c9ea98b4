//! Reserver contract

use crate::domain::{Reservation, ReservationId, Source};
use crate::error::Result;
use async_trait::async_trait;
use shared_types::{Outpoint, Timestamp};
use std::sync::Arc;

/// Reserves UTXOs for pending transactions.
#[async_trait]
pub trait UtxoReserver: Send + Sync {
    /// Reserve at least `amount` of `source` until `expiry`.
    async fn reserve(
        &self,
        source: &Source,
        amount: u64,
        client_token: Option<&str>,
        expiry: Timestamp,
    ) -> Result<Arc<Reservation>>;

    /// Reserve one specific UTXO until `expiry`.
    async fn reserve_utxo(
        &self,
        outpoint: &Outpoint,
        client_token: Option<&str>,
        expiry: Timestamp,
    ) -> Result<Arc<Reservation>>;

    /// Release a reservation. Unknown ids are ignored.
    async fn cancel(&self, id: ReservationId) -> Result<()>;

    /// Release every reservation whose expiry has passed; returns how many.
    async fn expire_reservations(&self) -> Result<usize>;
}

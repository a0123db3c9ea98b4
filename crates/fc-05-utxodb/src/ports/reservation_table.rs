//! Shared reservation table

use crate::domain::{Reservation, ReservationId, Source};
use crate::error::Result;
use async_trait::async_trait;
use shared_types::{Outpoint, Timestamp};

/// A reservation request as handed to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReserveRequest {
    pub source: Source,
    pub amount: u64,
    pub client_token: Option<String>,
    /// Caller's clock; rows expiring at or before it count as gone.
    pub now: Timestamp,
    pub expiry: Timestamp,
}

/// Reservation storage shared by several ledger processes.
///
/// Each method is one atomic procedure: it takes the table lock, reads the
/// candidate UTXOs and writes its result before releasing it. A request
/// whose client token matches a live reservation returns that reservation;
/// an expired match is deleted and the request is served as new.
#[async_trait]
pub trait ReservationTable: Send + Sync {
    async fn reserve_utxos(&self, request: ReserveRequest) -> Result<Reservation>;

    async fn reserve_outpoint(
        &self,
        outpoint: &Outpoint,
        client_token: Option<String>,
        now: Timestamp,
        expiry: Timestamp,
    ) -> Result<Reservation>;

    /// Delete a reservation, returning it if it existed.
    async fn cancel(&self, id: ReservationId) -> Result<Option<Reservation>>;

    /// Delete and return reservations expiring at or before `now`.
    async fn expire(&self, now: Timestamp) -> Result<Vec<Reservation>>;
}

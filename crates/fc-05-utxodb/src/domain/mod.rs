//! Reservation domain types and selection

pub mod entities;
pub mod idempotency;
pub mod select;

pub use entities::{Reservation, ReservationId, Source, Utxo};
pub use idempotency::IdempotencyGroup;
pub use select::{select_utxos, Selection};

//! Reservation ports

pub mod reservation_table;
pub mod reserver;
pub mod utxo_store;

pub use reservation_table::{ReservationTable, ReserveRequest};
pub use reserver::UtxoReserver;
pub use utxo_store::UtxoStore;

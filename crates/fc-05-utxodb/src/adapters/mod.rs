//! Reservation adapters

pub mod account_index;
pub mod mem_reserver;
pub mod memory_table;
pub mod table_reserver;

pub use account_index::AccountUtxoIndex;
pub use mem_reserver::MemReserver;
pub use memory_table::InMemoryReservationTable;
pub use table_reserver::TableReserver;

//! # fc-05-utxodb
//!
//! Reserves account UTXOs for transactions under construction so that two
//! concurrent builders never select the same output.
//!
//! ## Reservers
//!
//! | Reserver | Locking | Use |
//! |----------|---------|-----|
//! | `MemReserver` | top-level book lock + one lock per (asset, account) source | single ledger process |
//! | `TableReserver` | `ReservationTable::reserve_utxos` runs under a table lock | several processes sharing one table |
//!
//! Both share `select_utxos` and report the same errors:
//!
//! - `ReserveError::Insufficient`: every UTXO of the source together is
//!   still short. Retrying cannot help until funds arrive.
//! - `ReserveError::Reserved`: the source holds enough, but part of it is
//!   locked by other reservations. Retry after they resolve.
//!
//! ## Idempotency
//!
//! A request carrying a client token returns the same reservation for every
//! retry until the reservation is canceled or expires. Concurrent retries
//! wait for the first attempt; a failed attempt is not remembered.
//!
//! ## Lock order
//!
//! `MemReserver` never holds the reservation book lock and a source lock at
//! the same time. Cancel and expiry take the reservation out of the book,
//! release the book, and only then lock the source.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod expiry;
pub mod ports;

pub use adapters::*;
pub use config::ReserverConfig;
pub use domain::*;
pub use error::{ReserveError, Result};
pub use expiry::run_expiry_loop;
pub use ports::*;

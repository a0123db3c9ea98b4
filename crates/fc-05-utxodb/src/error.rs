//! Error types for UTXO reservation

use shared_types::Outpoint;
use thiserror::Error;

/// Result type alias for reservation operations
pub type Result<T> = std::result::Result<T, ReserveError>;

/// Reservation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReserveError {
    /// The source does not hold enough, reserved or not
    #[error("Insufficient funds: requested {requested}, source holds {available}")]
    Insufficient {
        /// Requested amount
        requested: u64,
        /// Sum of every UTXO of the source
        available: u128,
    },

    /// Enough exists, but part of it is held by other reservations
    #[error("Funds reserved: requested {requested}, only {unreserved} unreserved")]
    Reserved {
        /// Requested amount
        requested: u64,
        /// Sum of the UTXOs not held by any reservation
        unreserved: u128,
    },

    /// The requested outpoint is not a known UTXO
    #[error("UTXO not found: {0}")]
    UtxoNotFound(Outpoint),

    /// The backing store failed
    #[error("Store error: {0}")]
    Store(String),
}

impl ReserveError {
    /// True if the same request may succeed later without new deposits.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Reserved { .. } | Self::Store(_))
    }
}

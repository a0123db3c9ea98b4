//! Error types for transaction building

use fc_04_chain::ChainError;
use fc_05_utxodb::ReserveError;
use shared_crypto::CryptoError;
use shared_types::Hash;
use thiserror::Error;

/// Result type alias for builder operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Transaction building errors
#[derive(Debug, Error)]
pub enum BuildError {
    /// Templates were built for different chains
    #[error("Chain mismatch: expected {expected}, got {actual}")]
    ChainMismatch {
        /// Chain id of the first template
        expected: Hash,
        /// Conflicting chain id
        actual: Hash,
    },

    /// A source could not be reserved
    #[error("Reservation failed: {0}")]
    Reserve(#[from] ReserveError),

    /// An input does not have enough signatures yet
    #[error("Input {index} has {have} of {required} signatures")]
    MissingSignatures {
        /// Input index
        index: usize,
        /// Signatures the predicate requires
        required: usize,
        /// Signatures attached
        have: usize,
    },

    /// The template is inconsistent or uses an unsupported program
    #[error("Bad template: {0}")]
    BadTemplate(String),

    /// Signing failed
    #[error("Signing failed: {0}")]
    Signing(#[from] CryptoError),

    /// The chain rejected or could not accept the transaction
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),
}

//! Error types for the chain controller

use fc_03_validation::{BlockRejection, TxRejection};
use shared_crypto::CryptoError;
use shared_types::Hash;
use thiserror::Error;

/// Result type alias for chain operations
pub type Result<T> = std::result::Result<T, ChainError>;

/// Errors reported by a `Store` implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The write conflicts with what is already stored
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing storage failed
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Error returned by a chain listener callback
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

/// Errors returned by the chain controller
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transaction failed validation
    #[error("Transaction rejected: {0}")]
    TxRejected(#[from] TxRejection),

    /// Block failed validation
    #[error("Bad block: {0}")]
    BadBlock(#[from] BlockRejection),

    /// Block contains a transaction that is already confirmed
    #[error("Transaction {hash} is already confirmed")]
    TxAlreadyConfirmed {
        /// Hash of the replayed transaction
        hash: Hash,
    },

    /// Block does not extend the current tip
    #[error("Block at height {height} is stale; tip is at {tip}")]
    StaleTip {
        /// Height of the submitted block
        height: u64,
        /// Current tip height
        tip: u64,
    },

    /// No genesis block exists yet
    #[error("No genesis block")]
    NoGenesis,

    /// Persistence failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Signing failed
    #[error("Signature error: {0}")]
    Signing(#[from] CryptoError),

    /// The controller is shutting down
    #[error("Chain controller shut down")]
    Shutdown,
}

impl ChainError {
    /// True for errors caused by the submitted data rather than by this node.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::TxRejected(_) | Self::BadBlock(_) | Self::TxAlreadyConfirmed { .. }
        )
    }

    /// True if retrying the same call later may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::StaleTip { .. })
    }
}

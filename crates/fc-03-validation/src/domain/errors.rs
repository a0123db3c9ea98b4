use fc_02_state::StateError;
use shared_types::{AssetId, Hash, Outpoint, ScriptError};
use thiserror::Error;

/// Why a predicate rejected a spend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredicateError {
    #[error("Unsupported program")]
    UnsupportedProgram,

    #[error("Input index {index} out of range")]
    InputOutOfRange { index: usize },

    #[error("Malformed signature script: {0}")]
    MalformedSignatureScript(#[from] ScriptError),

    #[error("Malformed signature of {len} bytes")]
    MalformedSignature { len: usize },

    #[error("Invalid sighash type 0x{0:02x}")]
    BadSigHashType(u8),

    #[error("Not enough signatures: required {required}, valid {valid}")]
    NotEnoughSignatures { required: usize, valid: usize },

    #[error("Unknown contract {0}")]
    UnknownContract(Hash),

    #[error("Contract rejected spend: {0}")]
    ContractRejected(String),
}

/// Why a transaction was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxRejection {
    #[error("Transaction has no inputs")]
    NoInputs,

    #[error("Issuance transaction has {count} inputs, expected exactly 1")]
    IssuanceInputCount { count: usize },

    #[error("Input {index} duplicates outpoint {outpoint}")]
    DuplicateInput { index: usize, outpoint: Outpoint },

    #[error("Output {index} has zero amount")]
    ZeroAmountOutput { index: usize },

    #[error("Input {index} spends missing output {outpoint}")]
    MissingInput { index: usize, outpoint: Outpoint },

    #[error("Input {index} spends already spent output {outpoint}")]
    InputSpent { index: usize, outpoint: Outpoint },

    #[error("Lock time {lock_time} is after timestamp {timestamp}")]
    LockTime { lock_time: u64, timestamp: u64 },

    #[error("Issuance references chain {actual}, expected genesis {expected}")]
    IssuanceChainMismatch { expected: Hash, actual: Hash },

    #[error("Issuance input carries no issuance program")]
    IssuanceProgramMissing,

    #[error("Issuance output {index} has asset {actual}, expected {expected}")]
    IssuanceAssetMismatch {
        index: usize,
        expected: AssetId,
        actual: AssetId,
    },

    #[error("Issuance replays existing output {outpoint}")]
    IssuanceReplay { outpoint: Outpoint },

    #[error("Asset {asset_id} unbalanced by {net}")]
    Unbalanced { asset_id: AssetId, net: i128 },

    #[error("Input {index} predicate failed: {source}")]
    Predicate {
        index: usize,
        #[source]
        source: PredicateError,
    },
}

impl TxRejection {
    /// True if the rejection depends on which inputs are currently spent,
    /// i.e. the transaction conflicts with ledger state rather than being
    /// malformed.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::MissingInput { .. } | Self::InputSpent { .. } | Self::IssuanceReplay { .. }
        )
    }
}

/// Why a block was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockRejection {
    #[error("Bad height: expected {expected}, got {actual}")]
    BadHeight { expected: u64, actual: u64 },

    #[error("Bad previous block hash: expected {expected}, got {actual}")]
    BadPreviousHash { expected: Hash, actual: Hash },

    #[error("Timestamp {actual} precedes previous block timestamp {previous}")]
    TimestampRegressed { previous: u64, actual: u64 },

    #[error("Bad tx root: expected {expected}, got {actual}")]
    BadTxRoot { expected: Hash, actual: Hash },

    #[error("Bad state root: expected {expected}, got {actual}")]
    BadStateRoot { expected: Hash, actual: Hash },

    #[error("Bad block signature: {0}")]
    BadSignature(#[source] PredicateError),

    #[error("Transaction {index} ({hash}) rejected: {reason}")]
    Tx {
        index: usize,
        hash: Hash,
        #[source]
        reason: TxRejection,
    },

    #[error("State commitment failed: {0}")]
    State(#[from] StateError),
}

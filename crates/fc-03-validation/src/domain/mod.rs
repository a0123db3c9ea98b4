//! Validation domain.

pub mod block;
pub mod errors;
pub mod merkle;
pub mod multisig;
pub mod tx;

pub use block::{
    check_block_signature, commit_state, is_trusted_block, validate_block, validate_block_header,
    BlockDelta, BlockParams,
};
pub use errors::{BlockRejection, PredicateError, TxRejection};
pub use merkle::tx_root;
pub use multisig::{count_valid_signatures, sign_multisig};
pub use tx::{apply_tx, validate_and_apply_tx, validate_tx, TxParams};

//! Chain event callbacks

use crate::error::ListenerError;
use async_trait::async_trait;
use shared_types::{Block, Tx};

/// Receives chain events after they are persisted.
///
/// Errors are logged by the controller and do not roll anything back.
#[async_trait]
pub trait ChainListener: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// A transaction entered the pool, or was confirmed without passing
    /// through this node's pool.
    async fn on_tx(&self, tx: &Tx) -> Result<(), ListenerError>;

    /// A block was applied; `conflicts` were evicted from the pool.
    async fn on_block(&self, block: &Block, conflicts: &[Tx]) -> Result<(), ListenerError>;
}

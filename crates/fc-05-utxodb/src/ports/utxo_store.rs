//! Account UTXO source

use crate::domain::{Source, Utxo};
use crate::error::Result;
use async_trait::async_trait;
use shared_types::Outpoint;

/// Read access to the spendable outputs of accounts.
#[async_trait]
pub trait UtxoStore: Send + Sync {
    /// Every unspent UTXO of `source`, ascending by outpoint.
    async fn unspent_utxos(&self, source: &Source) -> Result<Vec<Utxo>>;

    async fn utxo(&self, outpoint: &Outpoint) -> Result<Option<Utxo>>;
}

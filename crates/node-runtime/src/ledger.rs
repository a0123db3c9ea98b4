//! # Ledger Context
//!
//! Every long-lived handle the node needs, built once in `Ledger::open`
//! and passed explicitly to the loops that use it.
//!
//! ```text
//! MemStore ──→ FedChain ──listeners──→ AccountUtxoIndex ──→ MemReserver ──→ TxBuilder
//!                       └────────────→ ContractIndex
//! ```

use crate::config::NodeConfig;
use anyhow::{Context, Result};
use fc_03_validation::StandardEngine;
use fc_04_chain::{sign_block, ContractIndex, FedChain, MemStore, TimeSource};
use fc_05_utxodb::{AccountUtxoIndex, MemReserver};
use fc_06_txbuilder::TxBuilder;
use shared_crypto::Secp256k1KeyPair;
use shared_types::Block;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Shared node state.
pub struct Ledger {
    pub chain: Arc<FedChain>,
    pub store: Arc<MemStore>,
    pub accounts: Arc<AccountUtxoIndex>,
    pub contracts: Arc<ContractIndex>,
    pub reserver: Arc<MemReserver>,
    pub builder: TxBuilder,
    signers: Vec<Secp256k1KeyPair>,
    time: Arc<dyn TimeSource>,
}

impl Ledger {
    /// Wire the subsystems together and make sure a genesis block exists.
    pub async fn open(config: &NodeConfig, time: Arc<dyn TimeSource>) -> Result<Self> {
        config.validate().context("invalid node configuration")?;
        let signers = config.genesis.key_pairs()?;
        let public_keys = config.genesis.public_keys()?;

        let store = Arc::new(MemStore::new());
        let chain = Arc::new(
            FedChain::new(
                store.clone(),
                config.chain.clone(),
                Arc::new(StandardEngine::new()),
                time.clone(),
            )
            .await
            .context("failed to open chain")?,
        );

        let accounts = Arc::new(AccountUtxoIndex::new());
        let contracts = Arc::new(ContractIndex::new());
        chain.add_listener(accounts.clone());
        chain.add_listener(contracts.clone());

        let genesis = chain
            .upsert_genesis_block(
                &public_keys,
                config.genesis.signatures_required,
                config.genesis.timestamp_ms,
            )
            .await
            .context("failed to create genesis block")?;

        let reserver = Arc::new(MemReserver::new(accounts.clone(), time.clone()));
        let builder = TxBuilder::new(
            reserver.clone(),
            genesis.hash(),
            time.clone(),
            config.reserver.clone(),
        );

        info!(
            "Ledger open: genesis {} at height {}",
            genesis.hash(),
            chain.height()
        );
        Ok(Self {
            chain,
            store,
            accounts,
            contracts,
            reserver,
            builder,
            signers,
            time,
        })
    }

    /// Generate, sign and apply a block from the pool.
    ///
    /// Does nothing while the pool is empty.
    pub async fn produce_block(&self) -> fc_04_chain::Result<Option<Block>> {
        if self.store.pool_len() == 0 {
            return Ok(None);
        }
        let (mut block, prev) = self.chain.generate_block(self.time.now()).await?;
        sign_block(&mut block.header, &prev.header.output_script, &self.signers)?;
        self.chain.add_block(block.clone()).await?;
        debug!(
            "Produced block {} with {} txs",
            block.height(),
            block.transactions.len()
        );
        Ok(Some(block))
    }
}

/// Call `produce_block` every `period` until shutdown is signaled.
pub async fn run_block_loop(
    ledger: Arc<Ledger>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match ledger.produce_block().await {
                    Ok(_) => {}
                    Err(e) if e.is_recoverable() => warn!("Block production failed: {}", e),
                    Err(e) => error!("Block production failed: {}", e),
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("Block loop shutting down");
                    return;
                }
            }
        }
    }
}

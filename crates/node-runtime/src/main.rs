//! # Fedchain Node
//!
//! ## Startup Sequence
//!
//! 1. Install the log subscriber (`RUST_LOG` overrides the level)
//! 2. Load configuration from `FC_CONFIG` and `FC_*` variables
//! 3. Open the ledger, creating genesis if the store is empty
//! 4. Spawn the block and expiry loops
//! 5. Wait for Ctrl+C, then signal shutdown and join the loops

use std::sync::Arc;

use anyhow::Result;
use fc_04_chain::SystemTimeSource;
use fc_05_utxodb::run_expiry_loop;
use node_runtime::{load_config, run_block_loop, Ledger};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config()?;
    let ledger = Arc::new(Ledger::open(&config, Arc::new(SystemTimeSource)).await?);

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let blocks = tokio::spawn(run_block_loop(
        Arc::clone(&ledger),
        config.block_period(),
        shutdown_rx.clone(),
    ));
    let expiry = tokio::spawn(run_expiry_loop(
        ledger.reserver.clone(),
        config.reserver.expiry_interval(),
        shutdown_rx,
    ));

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    info!("Initiating graceful shutdown...");
    if let Err(e) = shutdown_tx.send(true) {
        error!("Failed to send shutdown signal: {}", e);
    }
    let (blocks, expiry) = tokio::join!(blocks, expiry);
    blocks?;
    expiry?;

    info!("Shutdown complete at height {}", ledger.chain.height());
    Ok(())
}

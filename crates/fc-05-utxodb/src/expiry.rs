//! Periodic reservation expiry

use crate::ports::UtxoReserver;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// Call `expire_reservations` every `interval` until `shutdown` turns true
/// or its sender is dropped.
pub async fn run_expiry_loop(
    reserver: Arc<dyn UtxoReserver>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = reserver.expire_reservations().await {
                    warn!("[fc-05] Reservation expiry failed: {}", e);
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("[fc-05] Expiry loop shutting down");
                    return;
                }
            }
        }
    }
}

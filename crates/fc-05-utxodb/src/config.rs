//! Reserver configuration

use serde::Deserialize;
use shared_types::Timestamp;
use std::time::Duration;

/// Reservation timing settings
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ReserverConfig {
    /// Lifetime of a reservation when the caller gives none
    pub default_ttl_ms: u64,

    /// How often expired reservations are swept
    pub expiry_interval_ms: u64,
}

impl Default for ReserverConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: 60_000,
            expiry_interval_ms: 1_000,
        }
    }
}

impl ReserverConfig {
    /// Expiry time for a reservation made at `now` with an optional TTL.
    pub fn expiry(&self, now: Timestamp, ttl_ms: Option<u64>) -> Timestamp {
        now.saturating_add(ttl_ms.unwrap_or(self.default_ttl_ms))
    }

    pub fn expiry_interval(&self) -> Duration {
        Duration::from_millis(self.expiry_interval_ms.max(1))
    }
}

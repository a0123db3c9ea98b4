//! # Node Configuration
//!
//! One struct for the whole process. Values come from an optional JSON
//! file named by `FC_CONFIG`, then individual `FC_*` variables override
//! single fields.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `FC_SIGNER_KEYS` | `genesis.signer_keys` (comma separated hex) |
//! | `FC_SIGNATURES_REQUIRED` | `genesis.signatures_required` |
//! | `FC_BLOCK_PERIOD_MS` | `block_period_ms` |
//! | `FC_MAX_BLOCK_TXS` | `chain.max_block_txs` |
//! | `FC_RESERVATION_TTL_MS` | `reserver.default_ttl_ms` |

use fc_04_chain::ChainConfig;
use fc_05_utxodb::ReserverConfig;
use serde::Deserialize;
use shared_crypto::{Secp256k1KeyPair, Secp256k1PublicKey};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid value for {var}: {value}")]
    InvalidVar { var: &'static str, value: String },

    #[error("Invalid signer key #{index}")]
    InvalidSignerKey { index: usize },

    #[error("{required} signatures required but {keys} signer keys configured")]
    SignerQuorum { required: usize, keys: usize },
}

/// Federation that signs the genesis block and every block after it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Hex secret keys of the block signers this node holds.
    pub signer_keys: Vec<String>,
    pub signatures_required: usize,
    /// Timestamp written into the genesis header.
    pub timestamp_ms: u64,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            signer_keys: Vec::new(),
            signatures_required: 1,
            timestamp_ms: 0,
        }
    }
}

impl GenesisConfig {
    pub fn key_pairs(&self) -> Result<Vec<Secp256k1KeyPair>, ConfigError> {
        self.signer_keys
            .iter()
            .enumerate()
            .map(|(index, key)| {
                let bytes: [u8; 32] = hex::decode(key.trim())
                    .ok()
                    .and_then(|b| b.try_into().ok())
                    .ok_or(ConfigError::InvalidSignerKey { index })?;
                Secp256k1KeyPair::from_bytes(bytes)
                    .map_err(|_| ConfigError::InvalidSignerKey { index })
            })
            .collect()
    }

    pub fn public_keys(&self) -> Result<Vec<Secp256k1PublicKey>, ConfigError> {
        Ok(self.key_pairs()?.iter().map(|k| k.public_key()).collect())
    }
}

/// Complete node configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub chain: ChainConfig,
    pub reserver: ReserverConfig,
    pub genesis: GenesisConfig,
    /// Interval between block production attempts.
    pub block_period_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            reserver: ReserverConfig::default(),
            genesis: GenesisConfig::default(),
            block_period_ms: 1_000,
        }
    }
}

impl NodeConfig {
    pub fn block_period(&self) -> Duration {
        Duration::from_millis(self.block_period_ms.max(1))
    }

    /// Check that the configured keys can satisfy the genesis quorum.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let keys = self.genesis.key_pairs()?.len();
        let required = self.genesis.signatures_required;
        if required == 0 || required > keys {
            return Err(ConfigError::SignerQuorum { required, keys });
        }
        Ok(())
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let read_err = |reason: String| ConfigError::Read {
            path: path.display().to_string(),
            reason,
        };
        let text = std::fs::read_to_string(path).map_err(|e| read_err(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| read_err(e.to_string()))
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> Result<NodeConfig, ConfigError> {
    load_config_from(|var| std::env::var(var).ok())
}

/// Load configuration using `lookup` to read variables.
pub fn load_config_from(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<NodeConfig, ConfigError> {
    let mut config = match lookup("FC_CONFIG") {
        Some(path) => {
            info!("Loading configuration from {}", path);
            NodeConfig::from_file(Path::new(&path))?
        }
        None => NodeConfig::default(),
    };

    if let Some(keys) = lookup("FC_SIGNER_KEYS") {
        config.genesis.signer_keys = keys
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(n) = parsed(&lookup, "FC_SIGNATURES_REQUIRED")? {
        config.genesis.signatures_required = n;
    }
    if let Some(ms) = parsed(&lookup, "FC_BLOCK_PERIOD_MS")? {
        config.block_period_ms = ms;
    }
    if let Some(n) = parsed(&lookup, "FC_MAX_BLOCK_TXS")? {
        config.chain.max_block_txs = n;
    }
    if let Some(ms) = parsed(&lookup, "FC_RESERVATION_TTL_MS")? {
        config.reserver.default_ttl_ms = ms;
    }
    Ok(config)
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidVar { var, value })
        })
        .transpose()
}

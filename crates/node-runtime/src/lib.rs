//! # Node Runtime Library
//!
//! Process wiring for the fedchain node. The binary in `main.rs` loads a
//! [`NodeConfig`], opens a [`Ledger`] and runs two background loops:
//!
//! - block production every `block_period_ms` (`run_block_loop`)
//! - reservation expiry every `reserver.expiry_interval_ms`
//!   (`fc_05_utxodb::run_expiry_loop`)
//!
//! Both loops stop when the shared shutdown channel flips to `true`.

pub mod config;
pub mod ledger;

pub use config::{load_config, load_config_from, ConfigError, GenesisConfig, NodeConfig};
pub use ledger::{run_block_loop, Ledger};

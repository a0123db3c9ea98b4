//! # fc-04-chain
//!
//! The chain controller (`FedChain`): assembles candidate blocks from the
//! pending pool, validates and applies incoming blocks, admits pending
//! transactions, and creates the genesis block. Persistence sits behind the
//! `Store` port.
//!
//! ## Flows
//!
//! ```text
//! add_tx ──→ dedupe ──→ validate(pool ∘ chain) ──→ Store::apply_tx ──→ on_tx
//!
//! add_block ──→ validate_block(chain) ──→ Store::apply_block ──→ height++
//!                                              │
//!                                              ▼
//!                                   revalidate pool in order
//!                                   ├─ in block   → confirmed
//!                                   ├─ now fails  → conflicting (reported)
//!                                   └─ still ok   → stays pending
//!                                              │
//!                                              ▼
//!                          Store::remove_txs ──→ on_tx(new) + on_block(conflicts)
//! ```
//!
//! Listener failures are logged and never undo a persisted block.
//!
//! ## Ordering
//!
//! `add_block` and `add_tx` are serialized by one async write lock, so block
//! heights are applied gaplessly and pool admission never interleaves with a
//! pool rebuild.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use config::ChainConfig;
pub use domain::*;
pub use error::{ChainError, ListenerError, Result, StoreError};
pub use ports::*;
pub use service::FedChain;

/// Default cap on transactions per generated block.
pub const DEFAULT_MAX_BLOCK_TXS: usize = 10_000;

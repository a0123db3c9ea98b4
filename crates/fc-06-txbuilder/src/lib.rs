//! # fc-06-txbuilder
//!
//! Builds unsigned transaction templates from sources and destinations,
//! merges templates from several parties, signs them and assembles the
//! final transaction.
//!
//! ## Flow
//!
//! ```text
//! sources ──reserve──→ inputs + change ┐
//!                                      ├─→ Template ──combine──→ Template
//! destinations ──────→ outputs ────────┘        │
//!                                               ▼
//!                                  compute_sig_hashes / sign_template
//!                                               │
//!                                               ▼
//!                                  assemble_signatures ──→ Tx
//! ```
//!
//! | Source | Produces |
//! |--------|----------|
//! | `Source::Account` | inputs for reserved account UTXOs, plus change |
//! | `Source::Utxo` | one input for a specific reserved UTXO |
//! | `Source::Issuance` | one issuance input for a program's asset |
//!
//! A template records the chain it was built for (the genesis hash);
//! templates for different chains cannot be combined.

pub mod builder;
pub mod domain;
pub mod error;

pub use builder::TxBuilder;
pub use domain::*;
pub use error::{BuildError, Result};

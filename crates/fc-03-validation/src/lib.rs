//! # fc-03-validation
//!
//! Pure validation and application of transactions and blocks. No I/O, no
//! async, no locks: every function takes the state it needs as a view and
//! returns either the accepted effects or a structured rejection.
//!
//! ## Transaction Pipeline
//!
//! ```text
//! well-formed ─→ inputs unspent ─→ lock time ─┬─ issuance ─→ chain binding + asset binding ─┐
//!                                              └─ transfer ─→ balance ─→ predicates ────────┤
//!                                                                                            ↓
//!                                                                                       apply_tx
//! ```
//!
//! ## Block Pipeline
//!
//! 1. Header: height + 1, previous hash, non-decreasing timestamp
//! 2. Merkle tx root
//! 3. Signature script satisfies the previous block's output script
//! 4. Every transaction validated and applied in order on one overlay;
//!    the first failure rejects the whole block
//! 5. State root recomputed from the overlay deltas
//!
//! A block whose signature script carries a signature from a configured
//! trusted key skips step 4's predicate evaluation (the trusted signer
//! already ran it); structural, double-spend and balance checks still run.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::*;
pub use domain::*;
pub use ports::*;

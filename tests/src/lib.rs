//! # Fedchain Test Suite
//!
//! Scenarios that cross crate boundaries: a node built from the real
//! `Ledger` wiring, transactions built with the real builder, and blocks
//! signed by the configured federation.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs        # Node and account helpers
//!     ├── chain_flows.rs    # Issuance, double spends, conflicting blocks
//!     ├── reservations.rs   # Exclusion, idempotency, expiry
//!     └── properties.rs     # Balance and hash properties (proptest)
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p fc-tests
//! cargo test -p fc-tests integration::chain_flows
//! ```

pub mod integration;

//! # fc-02-state
//!
//! Ledger state: outputs with explicit spentness, asset-definition pointers,
//! layered views, and the patricia commitment over both.
//!
//! ## View Layering
//!
//! ```text
//!   validation overlay (MemView, writable)
//!          │ miss
//!          ▼
//!   pending pool view (spent tombstones shadow chain outputs)
//!          │ miss
//!          ▼
//!   confirmed chain view
//! ```
//!
//! Reads return the first layer that has a record. A pool output that is
//! spent is stored as a present record with `spent = true`, so it hides the
//! unspent chain record of the same outpoint. Writes only touch the overlay.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::*;
pub use domain::*;
pub use ports::*;

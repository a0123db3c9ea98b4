//! # fc-01-patricia
//!
//! Binary patricia tree over 256-bit keys, producing one root hash that
//! commits to every value in the set. Used for the `state_root` of each
//! block header.
//!
//! ## Structure
//!
//! ```text
//!              [branch key=01]            hash = H(H(left) ++ H(right))
//!               /            \
//!      [leaf key=0110..]   [branch key=1]
//!                            /        \
//!                      [leaf ..]    [leaf ..]
//! ```
//!
//! - A node's key is the bit suffix remaining after its parent's prefix and
//!   the one branching bit that selected it.
//! - Branches always have two children; deleting a leaf merges its sibling
//!   into the parent.
//! - A leaf's hash is its value's hash; the empty tree hashes to zero.

pub mod domain;

pub use domain::*;

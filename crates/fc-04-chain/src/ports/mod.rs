//! Ports for the chain controller

pub mod listener;
pub mod store;
pub mod time;

pub use listener::ChainListener;
pub use store::{Store, TxStatus};
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};

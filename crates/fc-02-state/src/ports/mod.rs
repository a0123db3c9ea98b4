//! View ports.

pub mod view;

pub use view::{View, ViewReader, ViewWriter};

pub mod standard_engine;

pub use standard_engine::StandardEngine;

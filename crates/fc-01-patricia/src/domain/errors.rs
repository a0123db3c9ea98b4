use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Key must be 256 bits, got {bits}")]
    KeyLength { bits: usize },
}

use fc_01_patricia::TreeError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("State tree error: {0}")]
    Tree(#[from] TreeError),
}

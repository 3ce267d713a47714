use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid message type: {0:?}")]
    InvalidMessageType(String),
    #[error("invalid transform: {0}")]
    InvalidTransform(String),
    #[error("invalid mapping entry: {0}")]
    InvalidMapping(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;

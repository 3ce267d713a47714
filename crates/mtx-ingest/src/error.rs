use thiserror::Error;

use mtx_model::ModelError;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("unable to detect MT type")]
    Undetermined,
    #[error("invalid forced message type {value:?}")]
    InvalidForcedType {
        value: String,
        #[source]
        source: ModelError,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("{source_name}: batch content is empty")]
    Empty { source_name: String },
    #[error("{source_name}: expected header, messages, and trailer lines")]
    TooShort { source_name: String },
    #[error("expected line to start with '{expected}|', got: {line:?}")]
    UnexpectedRecord { expected: &'static str, line: String },
    #[error("{source_name}: no MT messages found in batch body")]
    NoMessages { source_name: String },
}

pub type Result<T> = std::result::Result<T, DetectionError>;

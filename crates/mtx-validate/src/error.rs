use std::path::PathBuf;

use thiserror::Error;

use crate::xsd::XsdVersion;

/// Failures constructing a validator backend.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("unknown XSD validator backend '{name}'")]
    UnknownBackend { name: String },

    #[error("the XML Schema 1.1 backend is not available in this build")]
    Xsd11Unavailable,

    #[error("XSD_VALIDATOR_ENDPOINT must be set for the remote XSD validation backend")]
    MissingEndpoint,

    #[error("invalid validator timeout '{value}'")]
    InvalidTimeout { value: String },

    #[error("failed to build HTTP client for the remote validator")]
    HttpClient {
        #[source]
        source: reqwest::Error,
    },
}

/// Malformed XML, reported with the 1-based line it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct XmlError {
    pub line: usize,
    pub message: String,
}

impl XmlError {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Failures compiling an XSD document.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schema is not well-formed: {0}")]
    Malformed(#[from] XmlError),

    #[error("line {line}: {message}")]
    Invalid { line: usize, message: String },

    #[error("line {line}: unsupported schema construct '{construct}'")]
    Unsupported { line: usize, construct: String },

    #[error("line {line}: '{construct}' is not valid in XML Schema {version}")]
    VersionMismatch {
        line: usize,
        construct: String,
        version: XsdVersion,
    },
}

impl SchemaError {
    pub(crate) fn invalid(line: usize, message: impl Into<String>) -> Self {
        Self::Invalid {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(line: usize, construct: impl Into<String>) -> Self {
        Self::Unsupported {
            line,
            construct: construct.into(),
        }
    }
}

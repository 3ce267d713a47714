use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown namespace for {mx_type}")]
    UnknownNamespace { mx_type: String },

    #[error("failed to write XML: {source}")]
    Write {
        #[source]
        source: std::io::Error,
    },

    #[error("rendered XML is not UTF-8: {source}")]
    Utf8 {
        #[source]
        source: std::string::FromUtf8Error,
    },
}

pub type Result<T> = std::result::Result<T, BuildError>;

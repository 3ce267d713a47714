use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StandardsError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("routing catalog not found: {path}")]
    CatalogMissing { path: PathBuf },

    #[error("failed to parse YAML {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("mapping JSON not found: {path} (from catalog mapping_file '{mapping_file}')")]
    MappingFileMissing { path: PathBuf, mapping_file: String },

    #[error(
        "failed to parse mapping JSON: {path}\nJSON error at line {line}, column {column}: {message}\n\nContext:\n{context}"
    )]
    MappingJson {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
        context: String,
    },

    #[error("invalid mapping profile {path}: {message}")]
    InvalidProfile { path: PathBuf, message: String },

    #[error("unexpected field validations structure in {path}: {message}")]
    InvalidDefinitions { path: PathBuf, message: String },

    #[error("invalid lookups file {path}: {message}")]
    InvalidLookups { path: PathBuf, message: String },
}

impl StandardsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StandardsError>;

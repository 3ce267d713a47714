use thiserror::Error;

/// Failure of a single transform function.
#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("date_parse: {value:?} does not match format {format:?}")]
    DateParse { value: String, format: String },

    #[error("IBAN normalization failed: {length} characters, expected 15 to 34")]
    Iban { length: usize },

    #[error("regex_extract: invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("regex_extract: no such group {group}")]
    UnknownGroup { group: String },
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("transform {pipeline} failed for target {target}: {source}")]
    Mapping {
        target: String,
        pipeline: String,
        #[source]
        source: FunctionError,
    },

    #[error(
        "Validation failed: required path missing\n  required : {required}\n  looked at: {looked_at}\n  nearby   : {nearby:?}{}",
        ellipsis(.truncated)
    )]
    RequiredPathMissing {
        required: String,
        looked_at: String,
        nearby: Vec<String>,
        truncated: bool,
    },
}

fn ellipsis(truncated: &bool) -> &'static str {
    if *truncated { " ..." } else { "" }
}

pub type Result<T> = std::result::Result<T, TransformError>;

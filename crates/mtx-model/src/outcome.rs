//! Results returned by schema validation and by a translation.

use serde::{Deserialize, Serialize};

use crate::message::MessageType;

/// Outcome of validating an XML document against a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub ok: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    pub fn passed() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
        }
    }

    /// Fail-open result: validation did not run, the document is not blocked.
    pub fn skipped(diagnostic: impl Into<String>) -> Self {
        Self {
            ok: true,
            errors: vec![diagnostic.into()],
        }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self { ok: false, errors }
    }
}

pub const NO_CONVERSION_APPLICABLE: &str = "NO_CONVERSION_APPLICABLE";

/// A message converted to MX.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConvertedMessage {
    pub status: &'static str,
    pub mt_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub mx_type: String,
    pub xml: String,
    pub validation: ValidationOutcome,
    pub validator_engine: String,
    pub mapping_profile: Option<String>,
    pub mapped: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
    pub latency_ms: u64,
}

/// A message of a type with no mapping, returned unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassThrough {
    pub status: &'static str,
    pub code: &'static str,
    pub mt_type: String,
    pub mx_type: Option<String>,
    pub mode: &'static str,
    pub payload_preserved: bool,
    pub notes: String,
    pub mt_raw: String,
    pub validation: ValidationOutcome,
}

impl PassThrough {
    pub fn new(mt_type: &MessageType, raw: impl Into<String>) -> Self {
        Self {
            status: "ok",
            code: NO_CONVERSION_APPLICABLE,
            mt_type: mt_type.number().to_string(),
            mx_type: None,
            mode: "pass_through",
            payload_preserved: true,
            notes: format!("{mt_type} carried unchanged. No ISO 20022 conversion performed."),
            mt_raw: raw.into(),
            validation: ValidationOutcome::passed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Translation {
    Converted(ConvertedMessage),
    PassThrough(PassThrough),
}

impl Translation {
    pub fn mx_type(&self) -> Option<&str> {
        match self {
            Translation::Converted(msg) => Some(&msg.mx_type),
            Translation::PassThrough(_) => None,
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, Translation::PassThrough(_))
    }

    pub fn validation(&self) -> &ValidationOutcome {
        match self {
            Translation::Converted(msg) => &msg.validation,
            Translation::PassThrough(msg) => &msg.validation,
        }
    }
}

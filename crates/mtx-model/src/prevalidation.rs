//! Field definitions and the verdict produced by MT prevalidation.

use serde::{Deserialize, Serialize};

/// Error code attached to a mandatory field that has no value.
pub const PRESENCE_CODE: &str = "PRESENCE";

/// Pseudo field name for message-level errors.
pub const MESSAGE_FIELD: &str = "__message__";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Mandatory,
    #[default]
    #[serde(other)]
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldRule {
    #[serde(rename = "rule", alias = "rule_name")]
    pub rule_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

/// Validation requirements for one MT tag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FieldDefinition {
    #[serde(default, deserialize_with = "tag_text")]
    pub tag: String,
    #[serde(default)]
    pub presence: Presence,
    #[serde(default)]
    pub validations: Vec<FieldRule>,
}

/// Tags such as `20` may be written unquoted in YAML.
fn tag_text<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tag {
        Text(String),
        Number(u64),
    }
    Ok(match Tag::deserialize(deserializer)? {
        Tag::Text(text) => text,
        Tag::Number(n) => n.to_string(),
    })
}

impl FieldDefinition {
    pub fn is_mandatory(&self) -> bool {
        self.presence == Presence::Mandatory
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<usize>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: None,
            sequence: None,
            occurrence: None,
        }
    }

    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }

    pub fn at_occurrence(mut self, occurrence: usize) -> Self {
        self.occurrence = Some(occurrence);
        self
    }

    pub fn presence(tag: impl Into<String>) -> Self {
        Self::new(tag, "Field is mandatory but missing").with_code(Some(PRESENCE_CODE.into()))
    }

    pub fn message_level(message: impl Into<String>) -> Self {
        Self::new(MESSAGE_FIELD, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub mt_type: String,
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    #[serde(default)]
    pub warnings: Vec<ValidationError>,
}

impl ValidationResult {
    /// Build a verdict; `valid` is derived from `errors`.
    pub fn new(mt_type: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        Self {
            mt_type: mt_type.into(),
            valid: errors.is_empty(),
            errors,
            warnings: Vec::new(),
        }
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().filter_map(|e| e.code.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_parse_from_yaml() {
        let defs: Vec<FieldDefinition> = serde_yaml::from_str(
            r"
- tag: '20'
  presence: mandatory
  validations:
    - rule: slash_rule
      error_code: T26
- tag: 72
  presence: optional
- tag: '77B'
",
        )
        .unwrap();
        assert!(defs[0].is_mandatory());
        assert_eq!(defs[0].validations[0].rule_name, "slash_rule");
        assert_eq!(defs[0].validations[0].error_code.as_deref(), Some("T26"));
        assert!(!defs[1].is_mandatory());
        assert_eq!(defs[1].tag, "72");
        assert_eq!(defs[2].presence, Presence::Optional);
    }

    #[test]
    fn error_serialization_omits_empty_parts() {
        let err = ValidationError::presence("59");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"field": "59", "message": "Field is mandatory but missing", "code": "PRESENCE"})
        );
    }

    #[test]
    fn valid_tracks_errors() {
        assert!(ValidationResult::new("MT103", Vec::new()).valid);
        let result = ValidationResult::new("MT103", vec![ValidationError::presence("20")]);
        assert!(!result.valid);
        assert_eq!(result.codes().collect::<Vec<_>>(), ["PRESENCE"]);
    }
}

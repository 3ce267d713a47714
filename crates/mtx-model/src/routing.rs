//! Routing catalog entries: which mapping file and MX target serve an MT type.

use serde::{Deserialize, Serialize};

/// One row of the routing catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PairEntry {
    pub mt_code: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub variant: Option<String>,
    #[serde(default, alias = "out_json", deserialize_with = "empty_as_none")]
    pub mapping_file: Option<String>,
    #[serde(default, alias = "target_version", deserialize_with = "empty_as_none")]
    pub mx_type: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub xsd_dir: Option<String>,
}

impl PairEntry {
    /// True for the catch-all entry of an MT type.
    pub fn is_generic(&self) -> bool {
        self.variant.is_none()
    }

    pub fn matches(&self, mt_code: &str, variant: Option<&str>) -> bool {
        self.mt_code.eq_ignore_ascii_case(mt_code) && self.variant.as_deref() == variant
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

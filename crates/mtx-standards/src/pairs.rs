//! The routing catalog (`pairs.yaml`).

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use mtx_model::PairEntry;

use crate::error::{Result, StandardsError};

/// The catalog may be a bare list or a mapping with a `pairs` key.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<PairEntry>),
    Wrapped {
        #[serde(default)]
        pairs: Vec<PairEntry>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairTable {
    entries: Vec<PairEntry>,
}

impl PairTable {
    pub fn new(entries: Vec<PairEntry>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(StandardsError::CatalogMissing {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
        let table = Self::parse(&text).map_err(|e| StandardsError::yaml(path, e))?;
        debug!(path = %path.display(), pairs = table.entries.len(), "loaded routing catalog");
        Ok(table)
    }

    pub fn parse(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        let value: serde_yaml::Value = serde_yaml::from_str(text)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        let entries = match serde_yaml::from_value(value)? {
            CatalogFile::List(entries) | CatalogFile::Wrapped { pairs: entries } => entries,
        };
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PairEntry] {
        &self.entries
    }

    /// Exact `(mt_code, variant)` match, else the variant-less entry.
    pub fn resolve(&self, mt_code: &str, variant: Option<&str>) -> Option<&PairEntry> {
        let exact = variant.and_then(|variant| {
            self.entries
                .iter()
                .find(|entry| entry.matches(mt_code, Some(variant)))
        });
        exact.or_else(|| {
            self.entries
                .iter()
                .find(|entry| entry.matches(mt_code, None))
        })
    }
}

//! Prevalidation field definitions and shared lookup tables.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use mtx_model::FieldDefinition;

use crate::cache::FillOnceCache;
use crate::error::{Result, StandardsError};
use crate::paths::{field_validations_path, lookups_path};

/// MT types that share one definition set with their sibling categories.
const ALIASES: [(&str, &str); 2] = [("MT195", "MTn95"), ("MT196", "MTn96")];

/// Definition folder for an MT type.
pub fn definition_folder(mt_type: &str) -> String {
    let upper = mt_type.to_uppercase();
    ALIASES
        .iter()
        .find(|(code, _)| *code == upper)
        .map_or(upper.clone(), |(_, folder)| (*folder).to_string())
}

/// Named code sets from `lookups.yaml`; codes are upper-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTables {
    tables: BTreeMap<String, BTreeSet<String>>,
}

impl LookupTables {
    pub fn new(tables: BTreeMap<String, BTreeSet<String>>) -> Self {
        Self { tables }
    }

    pub fn codes(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.tables.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn from_yaml(path: &Path, value: serde_yaml::Value) -> Result<Self> {
        let serde_yaml::Value::Mapping(map) = value else {
            if value.is_null() {
                return Ok(Self::default());
            }
            return Err(StandardsError::InvalidLookups {
                path: path.to_path_buf(),
                message: "top level must be a mapping".to_string(),
            });
        };
        let mut tables = BTreeMap::new();
        for (name, body) in map {
            let Some(name) = scalar_text(&name) else {
                continue;
            };
            let codes: BTreeSet<String> = match body {
                serde_yaml::Value::Mapping(entries) => entries
                    .keys()
                    .filter_map(scalar_text)
                    .map(|code| code.to_uppercase())
                    .collect(),
                serde_yaml::Value::Sequence(items) => items
                    .iter()
                    .filter_map(scalar_text)
                    .map(|code| code.to_uppercase())
                    .collect(),
                _ => continue,
            };
            tables.insert(name, codes);
        }
        Ok(Self { tables })
    }
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Loads per-type field definitions and the shared lookups, caching both.
#[derive(Debug)]
pub struct FieldDefinitionsLoader {
    dir: PathBuf,
    definitions: FillOnceCache<String, Arc<Vec<FieldDefinition>>>,
    lookups: FillOnceCache<(), Arc<LookupTables>>,
}

impl FieldDefinitionsLoader {
    pub fn new(prevalidate_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: prevalidate_dir.into(),
            definitions: FillOnceCache::new(),
            lookups: FillOnceCache::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Definitions for `mt_type`, or `None` when the type has no file.
    ///
    /// Missing files are not cached, so definitions added later are picked up.
    pub fn definitions(&self, mt_type: &str) -> Result<Option<Arc<Vec<FieldDefinition>>>> {
        let key = mt_type.to_uppercase();
        if let Some(cached) = self.definitions.get(&key) {
            return Ok(Some(cached));
        }
        let path = field_validations_path(&self.dir, &definition_folder(&key));
        if !path.is_file() {
            debug!(mt_type = %key, path = %path.display(), "no field definitions");
            return Ok(None);
        }
        self.definitions
            .get_or_try_fill(&key, || read_definitions(&path).map(Arc::new))
            .map(Some)
    }

    /// Shared lookups; an absent file yields empty tables.
    pub fn lookups(&self) -> Result<Arc<LookupTables>> {
        self.lookups.get_or_try_fill(&(), || {
            let path = lookups_path(&self.dir);
            if !path.is_file() {
                return Ok(Arc::new(LookupTables::default()));
            }
            let text = std::fs::read_to_string(&path).map_err(|e| StandardsError::io(&path, e))?;
            let value: serde_yaml::Value =
                serde_yaml::from_str(&text).map_err(|e| StandardsError::yaml(&path, e))?;
            LookupTables::from_yaml(&path, value).map(Arc::new)
        })
    }
}

fn read_definitions(path: &Path) -> Result<Vec<FieldDefinition>> {
    let text = std::fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
    let value: serde_yaml::Value =
        serde_yaml::from_str(&text).map_err(|e| StandardsError::yaml(path, e))?;
    if value.is_null() {
        return Ok(Vec::new());
    }
    if !value.is_sequence() {
        return Err(StandardsError::InvalidDefinitions {
            path: path.to_path_buf(),
            message: "expected a list of field definitions".to_string(),
        });
    }
    let definitions: Vec<FieldDefinition> =
        serde_yaml::from_value(value).map_err(|e| StandardsError::yaml(path, e))?;
    debug!(path = %path.display(), fields = definitions.len(), "loaded field definitions");
    Ok(definitions)
}

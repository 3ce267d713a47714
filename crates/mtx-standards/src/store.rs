//! Mapping profile resolution and loading.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use mtx_model::{MappingProfile, PairEntry};

use crate::cache::FillOnceCache;
use crate::error::{Result, StandardsError};
use crate::pairs::PairTable;
use crate::paths::{pairs_path, resolve_relative};
use crate::relaxed_json::load_json;

/// A routed, loaded mapping profile.
#[derive(Debug, Clone)]
pub struct LoadedProfile {
    pub profile: Arc<MappingProfile>,
    /// Catalog name of the mapping file.
    pub mapping_file: String,
    pub mx_type: String,
    /// Schema location; `None` when the catalog names none or it does not exist.
    pub xsd_dir: Option<PathBuf>,
}

/// Routes `(MT type, variant)` pairs to mapping profiles under a standards root.
#[derive(Debug)]
pub struct MappingStore {
    root: PathBuf,
    pairs: PairTable,
    profiles: FillOnceCache<PathBuf, Arc<MappingProfile>>,
}

impl MappingStore {
    /// Load the routing catalog; a missing catalog is an error.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let pairs = PairTable::load(&pairs_path(&root))?;
        Ok(Self::with_pairs(root, pairs))
    }

    pub fn with_pairs(root: impl Into<PathBuf>, pairs: PairTable) -> Self {
        Self {
            root: root.into(),
            pairs,
            profiles: FillOnceCache::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pairs(&self) -> &PairTable {
        &self.pairs
    }

    pub fn resolve(&self, mt_type: &str, variant: Option<&str>) -> Option<&PairEntry> {
        self.pairs.resolve(mt_type, variant)
    }

    /// Resolve and load the profile for `(mt_type, variant)`.
    ///
    /// `Ok(None)` means no route applies and the message should pass
    /// through. A route whose mapping file is missing is an error.
    pub fn load_profile(&self, mt_type: &str, variant: Option<&str>) -> Result<Option<LoadedProfile>> {
        let Some(entry) = self.resolve(mt_type, variant) else {
            debug!(mt_type, variant = ?variant, "no routing entry");
            return Ok(None);
        };
        let (Some(mapping_file), Some(mx_type)) = (&entry.mapping_file, &entry.mx_type) else {
            debug!(mt_type, variant = ?variant, "routing entry without mapping file or MX type");
            return Ok(None);
        };

        let mapping_path = resolve_relative(&self.root, mapping_file);
        if !mapping_path.is_file() {
            return Err(StandardsError::MappingFileMissing {
                path: mapping_path,
                mapping_file: mapping_file.clone(),
            });
        }

        let xsd_dir = entry.xsd_dir.as_deref().and_then(|dir| {
            let path = resolve_relative(&self.root, dir);
            if path.exists() {
                Some(path)
            } else {
                warn!(mt_type, xsd_dir = %path.display(), "schema location does not exist");
                None
            }
        });

        let profile = self
            .profiles
            .get_or_try_fill(&mapping_path, || read_profile(&mapping_path).map(Arc::new))?;

        Ok(Some(LoadedProfile {
            profile,
            mapping_file: mapping_file.clone(),
            mx_type: mx_type.clone(),
            xsd_dir,
        }))
    }
}

/// Parse one mapping profile file.
pub fn read_profile(path: &Path) -> Result<MappingProfile> {
    let value = load_json(path)?;
    if !value.is_object() {
        return Err(StandardsError::InvalidProfile {
            path: path.to_path_buf(),
            message: "mapping must be a JSON object at top level".to_string(),
        });
    }
    let profile: MappingProfile =
        serde_json::from_value(value).map_err(|e| StandardsError::InvalidProfile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    debug!(
        path = %path.display(),
        mx_root = profile.mx_root(),
        entries = profile.entry_count(),
        "loaded mapping profile"
    );
    Ok(profile)
}

//! Standards directory path resolution.

use std::path::{Path, PathBuf};

/// Environment variable for overriding the standards directory.
pub const STANDARDS_ENV_VAR: &str = "MTX_STANDARDS_DIR";

const PAIRS_FILE: &str = "pairs.yaml";
const PREVALIDATE_DIR: &str = "prevalidate";
const LOOKUPS_FILE: &str = "lookups.yaml";
const FIELD_VALIDATIONS_FILE: &str = "fieldvalidations.yaml";

/// Get the standards root directory.
///
/// Resolution order:
/// 1. `MTX_STANDARDS_DIR` environment variable
/// 2. `standards/` directory relative to workspace root
pub fn standards_root() -> PathBuf {
    if let Ok(root) = std::env::var(STANDARDS_ENV_VAR) {
        return PathBuf::from(root);
    }
    bundled_standards_root()
}

/// The `standards/` tree shipped with the workspace.
pub fn bundled_standards_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../standards")
}

/// Routing catalog under a standards root.
pub fn pairs_path(root: &Path) -> PathBuf {
    root.join(PAIRS_FILE)
}

pub fn prevalidate_dir(root: &Path) -> PathBuf {
    root.join(PREVALIDATE_DIR)
}

/// Field definitions for one definition folder (`MT103`, `MTn96`, ...).
pub fn field_validations_path(prevalidate_dir: &Path, folder: &str) -> PathBuf {
    prevalidate_dir.join(folder).join(FIELD_VALIDATIONS_FILE)
}

pub fn lookups_path(prevalidate_dir: &Path) -> PathBuf {
    prevalidate_dir.join(LOOKUPS_FILE)
}

/// Resolve a catalog path against the standards root unless it is absolute.
pub fn resolve_relative(root: &Path, relative: &str) -> PathBuf {
    let candidate = Path::new(relative);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}

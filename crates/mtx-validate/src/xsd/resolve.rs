use std::fs;
use std::path::{Path, PathBuf};

use mtx_output::iso_urn;
use tracing::debug;

use crate::xsd::dom::root_attribute;

/// Locate the schema for `mx_type`.
///
/// `xsd_dir` may name the schema file itself. Otherwise the directory is
/// searched for `<mx_type>.xsd`, then for any `.xsd` whose target namespace
/// is the message type's ISO 20022 URN.
pub fn resolve_schema_path(xsd_dir: Option<&Path>, mx_type: &str) -> Option<PathBuf> {
    let dir = xsd_dir?;
    if dir.is_file() {
        return Some(dir.to_path_buf());
    }
    if !dir.is_dir() {
        return None;
    }

    let direct = dir.join(format!("{mx_type}.xsd"));
    if direct.is_file() {
        return Some(direct);
    }

    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "xsd"))
        .collect();
    candidates.sort();

    let urn = iso_urn(mx_type);
    let found = candidates.into_iter().find(|path| {
        fs::read_to_string(path)
            .ok()
            .and_then(|text| root_attribute(&text, "targetNamespace"))
            .is_some_and(|ns| ns == urn)
    });
    debug!(dir = %dir.display(), mx_type, found = ?found, "scanned schema directory");
    found
}

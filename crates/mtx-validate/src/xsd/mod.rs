//! XML Schema validation of generated MX documents.
//!
//! [`XsdValidator`] picks a [`SchemaBackend`] from [`ValidatorConfig`],
//! resolves the schema for the message type, and validates documents. A
//! schema that is missing or cannot be compiled, or a remote service that
//! cannot be reached, yields an `ok` outcome carrying a diagnostic instead of
//! rejecting the document.

pub mod dom;
pub mod native;
pub mod remote;
pub mod resolve;
pub mod schema;
pub mod types;
pub mod validate;

use std::path::{Path, PathBuf};

use mtx_model::ValidationOutcome;
use tracing::{debug, info};

use crate::config::{BackendKind, ValidatorConfig};
use crate::error::ValidatorError;

pub use crate::xsd::native::{NativeBackend, SchemaCache};
pub use crate::xsd::remote::{RemoteBackend, parse_remote_payload};
pub use crate::xsd::resolve::resolve_schema_path;
pub use crate::xsd::schema::{Schema, XsdVersion};

/// A validation engine. `load` never fails; problems surface from `validate`.
pub trait SchemaBackend: Send + Sync {
    fn identifier(&self) -> String;

    fn load(&mut self, schema_path: Option<&Path>, mx_type: &str);

    fn validate(&self, xml: &str) -> ValidationOutcome;
}

fn select_backend(
    config: &ValidatorConfig,
    cache: &SchemaCache,
    mx_type: &str,
) -> Result<Box<dyn SchemaBackend>, ValidatorError> {
    let native = |version| -> Box<dyn SchemaBackend> { Box::new(NativeBackend::new(version, cache.clone())) };
    Ok(match config.backend {
        BackendKind::Auto if cfg!(feature = "xsd11") => native(XsdVersion::V1_1),
        BackendKind::Auto | BackendKind::Xsd10 => native(XsdVersion::V1_0),
        BackendKind::Xsd11 if cfg!(feature = "xsd11") => native(XsdVersion::V1_1),
        BackendKind::Xsd11 => return Err(ValidatorError::Xsd11Unavailable),
        BackendKind::Remote => Box::new(RemoteBackend::new(config, mx_type)?),
    })
}

/// Validates documents of one MX type.
pub struct XsdValidator {
    backend: Box<dyn SchemaBackend>,
    schema_path: Option<PathBuf>,
    mx_type: String,
}

impl XsdValidator {
    pub fn new(config: &ValidatorConfig, xsd_dir: Option<&Path>, mx_type: &str) -> Result<Self, ValidatorError> {
        Self::with_cache(config, &SchemaCache::new(), xsd_dir, mx_type)
    }

    /// Like [`XsdValidator::new`], reusing schemas compiled by earlier validators.
    pub fn with_cache(
        config: &ValidatorConfig,
        cache: &SchemaCache,
        xsd_dir: Option<&Path>,
        mx_type: &str,
    ) -> Result<Self, ValidatorError> {
        let mut backend = select_backend(config, cache, mx_type)?;
        let schema_path = resolve_schema_path(xsd_dir, mx_type);
        backend.load(schema_path.as_deref(), mx_type);
        debug!(
            mx_type,
            backend = %backend.identifier(),
            schema = ?schema_path,
            "xsd validator ready"
        );
        Ok(Self {
            backend,
            schema_path,
            mx_type: mx_type.to_string(),
        })
    }

    pub fn validate(&self, xml: &str) -> ValidationOutcome {
        let outcome = self.backend.validate(xml);
        info!(
            mx_type = %self.mx_type,
            backend = %self.backend.identifier(),
            ok = outcome.ok,
            errors = outcome.errors.len(),
            "xsd validation finished"
        );
        outcome
    }

    pub fn engine_name(&self) -> String {
        self.backend.identifier()
    }

    pub fn schema_path(&self) -> Option<&Path> {
        self.schema_path.as_deref()
    }
}

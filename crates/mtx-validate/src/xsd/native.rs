use std::path::{Path, PathBuf};
use std::sync::Arc;

use mtx_model::ValidationOutcome;
use mtx_standards::FillOnceCache;
use tracing::{debug, warn};

use crate::error::SchemaError;
use crate::xsd::schema::{Schema, XsdVersion};
use crate::xsd::validate::validate;
use crate::xsd::SchemaBackend;

/// Compiled schemas shared between validators, keyed by file and XSD version.
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    inner: Arc<FillOnceCache<(PathBuf, XsdVersion), Arc<Schema>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(&self, path: &Path, version: XsdVersion) -> Result<Arc<Schema>, SchemaError> {
        self.inner
            .get_or_try_fill(&(path.to_path_buf(), version), || {
                Schema::load(path, version).map(Arc::new)
            })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// In-process validation for XML Schema 1.0 or 1.1.
#[derive(Debug)]
pub struct NativeBackend {
    version: XsdVersion,
    cache: SchemaCache,
    schema: Option<Arc<Schema>>,
    unavailable: Option<String>,
}

impl NativeBackend {
    pub fn new(version: XsdVersion, cache: SchemaCache) -> Self {
        Self {
            version,
            cache,
            schema: None,
            unavailable: None,
        }
    }
}

impl SchemaBackend for NativeBackend {
    fn identifier(&self) -> String {
        match self.version {
            XsdVersion::V1_0 => "xsd10".to_string(),
            XsdVersion::V1_1 => "xsd11".to_string(),
        }
    }

    fn load(&mut self, schema_path: Option<&Path>, mx_type: &str) {
        self.schema = None;
        let Some(path) = schema_path else {
            self.unavailable = Some(format!("XSD file for {mx_type} not found"));
            return;
        };
        match self.cache.get_or_compile(path, self.version) {
            Ok(schema) => {
                debug!(path = %path.display(), mx_type, backend = %self.identifier(), "schema ready");
                self.schema = Some(schema);
                self.unavailable = None;
            }
            Err(err) => {
                warn!(path = %path.display(), mx_type, error = %err, "schema could not be compiled, validation will be skipped");
                self.unavailable = Some(format!(
                    "{} backend failed to parse schema: {err}",
                    self.identifier()
                ));
            }
        }
    }

    fn validate(&self, xml: &str) -> ValidationOutcome {
        let Some(schema) = &self.schema else {
            let reason = self
                .unavailable
                .as_deref()
                .unwrap_or("schema unavailable");
            return ValidationOutcome::skipped(format!("XSD validation skipped: {reason}"));
        };
        let errors = validate(schema, xml);
        if errors.is_empty() {
            ValidationOutcome::passed()
        } else {
            ValidationOutcome::failed(errors)
        }
    }
}

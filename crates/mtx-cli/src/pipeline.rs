//! Translation of one MT message, in stages:
//!
//! 1. **Detect** the message type (a forced type wins)
//! 2. **Parse** blocks and tags, classify the variant
//! 3. **Prevalidate** against the field definitions (optional gate)
//! 4. **Route** to a mapping profile, or pass the message through
//! 5. **Transform** into a flat path document and **build** the MX XML
//! 6. **Validate** the XML against its schema (fail-open)

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, info_span, trace, warn};

use mtx_ingest::{DetectionError, classify_variant, detect, parse};
use mtx_model::{ConvertedMessage, PassThrough, Translation, ValidationResult};
use mtx_output::BuildError;
use mtx_standards::{FieldDefinitionsLoader, MappingStore, StandardsError, prevalidate_dir};
use mtx_transform::{TransformContext, TransformEngine, TransformError};
use mtx_validate::{PrevalidationEngine, SchemaCache, ValidatorConfig, ValidatorError, XsdValidator};

use crate::logging::redact_value;

/// Why a message could not be translated.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error("Prevalidation failed")]
    Prevalidation(Box<ValidationResult>),

    #[error(transparent)]
    Standards(#[from] StandardsError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Validator(#[from] ValidatorError),
}

impl PipelineError {
    /// HTTP-style status: 400 for undetectable input, 422 for a prevalidation
    /// rejection, 500 for everything else.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Detection(_) => 400,
            Self::Prevalidation(_) => 422,
            _ => 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TranslateOptions {
    pub force_type: Option<String>,
    pub prevalidate: bool,
    pub request_id: Option<String>,
    /// Pins `$now`; the current time is used when unset.
    pub now: Option<DateTime<Utc>>,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            force_type: None,
            prevalidate: true,
            request_id: None,
            now: None,
        }
    }
}

/// Everything needed to translate messages against one standards tree.
///
/// Caches inside (profiles, field definitions, compiled schemas) fill on
/// first use, so one translator can be shared by all batch workers.
#[derive(Debug)]
pub struct Translator {
    store: MappingStore,
    engine: TransformEngine,
    prevalidation: PrevalidationEngine,
    schemas: SchemaCache,
    validator: ValidatorConfig,
}

impl Translator {
    pub fn open(standards_dir: &Path, validator: ValidatorConfig) -> Result<Self, StandardsError> {
        let store = MappingStore::open(standards_dir)?;
        let loader = FieldDefinitionsLoader::new(prevalidate_dir(standards_dir));
        debug!(
            standards = %standards_dir.display(),
            pairs = store.pairs().entries().len(),
            backend = %validator.backend,
            "translator ready"
        );
        Ok(Self {
            store,
            engine: TransformEngine::new(),
            prevalidation: PrevalidationEngine::new(loader),
            schemas: SchemaCache::new(),
            validator,
        })
    }

    pub fn store(&self) -> &MappingStore {
        &self.store
    }

    pub fn prevalidation(&self) -> &PrevalidationEngine {
        &self.prevalidation
    }

    pub fn translate(&self, raw: &str, options: &TranslateOptions) -> Result<Translation, PipelineError> {
        let started = Instant::now();
        let mt_type = detect(raw, options.force_type.as_deref())?;
        let span = info_span!("translate", mt_type = %mt_type, request_id = ?options.request_id);
        let _guard = span.enter();
        trace!(mt_raw = redact_value(raw), "translating message");

        let message = parse(&mt_type, raw);
        let variant = classify_variant(&message);

        if options.prevalidate {
            let verdict = self.prevalidation.validate(raw, Some(mt_type.as_str()))?;
            if !verdict.valid {
                warn!(errors = verdict.errors.len(), "prevalidation rejected message");
                return Err(PipelineError::Prevalidation(Box::new(verdict)));
            }
        }

        let Some(loaded) = self.store.load_profile(mt_type.as_str(), variant)? else {
            info!(variant = ?variant, "no conversion applicable, passing message through");
            return Ok(Translation::PassThrough(PassThrough::new(&mt_type, raw)));
        };

        let ctx = TransformContext::at(
            options.request_id.clone(),
            options.now.unwrap_or_else(Utc::now),
        );
        let output = self.engine.apply(&loaded.profile, &message, &ctx)?;
        let xml = mtx_output::build(&loaded.mx_type, &output.flat)?;

        let validator = XsdValidator::with_cache(
            &self.validator,
            &self.schemas,
            loaded.xsd_dir.as_deref(),
            &loaded.mx_type,
        )?;
        let validation = validator.validate(&xml);
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            mx_type = %loaded.mx_type,
            variant = ?variant,
            mapped = output.mapped.len(),
            valid = validation.ok,
            latency_ms,
            "translated message"
        );
        Ok(Translation::Converted(ConvertedMessage {
            status: "ok",
            mt_type: mt_type.to_string(),
            variant: variant.map(str::to_string),
            mx_type: loaded.mx_type,
            xml,
            validation,
            validator_engine: validator.engine_name(),
            mapping_profile: Some(loaded.mapping_file),
            mapped: output.mapped,
            diagnostics: output
                .diagnostics
                .iter()
                .map(|d| format!("{}: {}", d.target, d.message))
                .collect(),
            latency_ms,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_by_failure() {
        assert_eq!(PipelineError::Detection(DetectionError::Undetermined).status_code(), 400);
        let verdict = ValidationResult::new("MT103", Vec::new());
        assert_eq!(PipelineError::Prevalidation(Box::new(verdict)).status_code(), 422);
        let missing = StandardsError::CatalogMissing {
            path: "pairs.yaml".into(),
        };
        assert_eq!(PipelineError::Standards(missing).status_code(), 500);
    }
}

//! Evaluation of a mapping profile against a parsed MT message.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::{debug, warn};

use mtx_model::{
    AttributeValue, FlatDocument, MappingEntry, MappingProfile, ParsedMessage, SimpleMapping,
    SwitchMapping, TransformErrorPolicy, TransformPipeline, TransformStep, ValueExpr,
};
use mtx_standards::FillOnceCache;

use crate::context::TransformContext;
use crate::emitter::{FlatEmitter, join};
use crate::error::{FunctionError, Result, TransformError};
use crate::functions::{self, TransformValue};

const MSG_ID_PATH: &str = "GrpHdr/MsgId";
const NEARBY_LIMIT: usize = 10;

/// A transform failure that was skipped under the `warn_and_copy_raw` policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformDiagnostic {
    pub source: Option<String>,
    pub target: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub flat: FlatDocument,
    /// Emitted paths, sorted.
    pub mapped: Vec<String>,
    pub diagnostics: Vec<TransformDiagnostic>,
}

/// Interpreter for mapping profiles.
///
/// Holds only compiled `regex_extract` patterns, so one engine can serve
/// concurrent translations.
#[derive(Debug, Default)]
pub struct TransformEngine {
    patterns: FillOnceCache<String, Arc<Regex>>,
}

impl TransformEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(
        &self,
        profile: &MappingProfile,
        message: &ParsedMessage,
        ctx: &TransformContext,
    ) -> Result<TransformOutput> {
        let mut run = Run {
            engine: self,
            message,
            ctx,
            policy: profile.transform_error_policy(),
            emitter: FlatEmitter::new(profile.mx_root()),
            diagnostics: Vec::new(),
        };

        run.apply_defaults(profile);
        for block in &profile.blocks {
            let base = block.base();
            for entry in &block.mappings {
                match entry {
                    MappingEntry::Simple(mapping) => run.emit_simple(mapping, base)?,
                    MappingEntry::Switch(switch) => run.emit_switch(switch, base)?,
                }
            }
        }

        let Run {
            emitter,
            diagnostics,
            ..
        } = run;
        check_required(profile, &emitter)?;

        let flat = emitter.into_flat();
        let mut mapped: Vec<String> = flat.paths().map(str::to_string).collect();
        mapped.sort();
        debug!(
            mx_root = profile.mx_root(),
            paths = mapped.len(),
            skipped = diagnostics.len(),
            "applied mapping profile"
        );
        Ok(TransformOutput {
            flat,
            mapped,
            diagnostics,
        })
    }

    /// Run `pipeline` over `value`, left to right.
    pub fn run_pipeline(
        &self,
        pipeline: &TransformPipeline,
        value: TransformValue,
        ctx: &TransformContext,
    ) -> std::result::Result<TransformValue, FunctionError> {
        pipeline
            .steps()
            .iter()
            .try_fold(value, |value, step| self.run_step(step, value, ctx))
    }

    fn run_step(
        &self,
        step: &TransformStep,
        value: TransformValue,
        ctx: &TransformContext,
    ) -> std::result::Result<TransformValue, FunctionError> {
        match step {
            TransformStep::ToDecimal => value.try_map(|v| Ok(Some(functions::to_decimal(v)))),
            TransformStep::DateParse { format } => {
                value.try_map(|v| functions::date_parse(v, format).map(Some))
            }
            TransformStep::IbanNormalize => value.try_map(|v| functions::iban_normalize(v).map(Some)),
            TransformStep::Lines => Ok(match value {
                TransformValue::Text(text) => TransformValue::List(functions::lines(&text)),
                other => other,
            }),
            TransformStep::Truncate { max } => {
                value.try_map(|v| Ok(Some(functions::truncate(v, *max))))
            }
            TransformStep::Upper => value.try_map(|v| Ok(Some(functions::upper(v)))),
            TransformStep::Now => Ok(TransformValue::Text(ctx.timestamp())),
            TransformStep::ChargeCode => value.try_map(|v| Ok(Some(functions::charge_code(v)))),
            TransformStep::RegexExtract { pattern, group } => {
                if value.is_absent() {
                    return Ok(TransformValue::Absent);
                }
                let regex = self.pattern(pattern)?;
                value.try_map(|v| functions::regex_extract(v, &regex, group))
            }
        }
    }

    fn pattern(&self, pattern: &str) -> std::result::Result<Arc<Regex>, FunctionError> {
        self.patterns.get_or_try_fill(&pattern.to_string(), || {
            RegexBuilder::new(pattern)
                .multi_line(true)
                .dot_matches_new_line(true)
                .build()
                .map(Arc::new)
                .map_err(|source| FunctionError::Pattern {
                    pattern: pattern.to_string(),
                    source,
                })
        })
    }
}

/// State of one profile evaluation.
struct Run<'a> {
    engine: &'a TransformEngine,
    message: &'a ParsedMessage,
    ctx: &'a TransformContext,
    policy: TransformErrorPolicy,
    emitter: FlatEmitter,
    diagnostics: Vec<TransformDiagnostic>,
}

impl Run<'_> {
    /// First occurrence of the tag named by `source` (any `.suffix` ignored).
    fn get_value(&self, source: &str) -> Option<&str> {
        let tag = source.split_once('.').map_or(source, |(tag, _)| tag);
        self.message.first(tag)
    }

    fn apply_defaults(&mut self, profile: &MappingProfile) {
        let timestamp = self.ctx.timestamp();
        for (path, default) in &profile.defaults {
            let value = match &default.value {
                None => None,
                Some(ValueExpr::Now) => Some(timestamp.clone()),
                Some(ValueExpr::RequestId) => match &self.ctx.request_id {
                    Some(id) => Some(id.clone()),
                    None if path == MSG_ID_PATH => Some(timestamp.clone()),
                    None => None,
                },
                Some(ValueExpr::Literal(text)) => Some(text.clone()),
            };
            let value = TransformValue::from_option(value.as_deref());
            self.emitter.put_target("", path, &value);
        }
    }

    fn emit_switch(&mut self, switch: &SwitchMapping, base: &str) -> Result<()> {
        let fired = switch
            .branches
            .iter()
            .find(|branch| self.get_value(&branch.condition.exists).is_some());
        if let Some(branch) = fired {
            for mapping in &branch.mappings {
                self.emit_simple(mapping, base)?;
            }
            return Ok(());
        }

        let guarded = switch.when_any.is_empty()
            || switch
                .when_any
                .iter()
                .any(|probe| self.get_value(&probe.exists).is_some());
        if guarded {
            for mapping in &switch.default {
                self.emit_simple(mapping, base)?;
            }
        }
        Ok(())
    }

    fn emit_simple(&mut self, mapping: &SimpleMapping, base: &str) -> Result<()> {
        let raw = match &mapping.source {
            Some(source) => self.get_value(source).map(str::to_string),
            None => mapping.value.as_ref().map(|v| v.as_str().to_string()),
        };
        let raw_value = TransformValue::from_option(raw.as_deref());

        let value = match &mapping.transform {
            None => raw_value.clone(),
            Some(pipeline) => match self
                .engine
                .run_pipeline(pipeline, raw_value.clone(), self.ctx)
            {
                Ok(value) => value,
                Err(err) => return self.on_transform_error(mapping, pipeline, base, &raw_value, err),
            },
        };

        for (name, attr) in &mapping.attributes {
            let attr_value = match attr {
                AttributeValue::Literal(text) => TransformValue::Text(text.clone()),
                AttributeValue::MtField(tag) => TransformValue::from_option(self.get_value(tag)),
            };
            self.emitter
                .put_attr(&join(base, &mapping.target), name, &attr_value);
        }

        self.emitter.put_target(base, &mapping.target, &value);
        Ok(())
    }

    fn on_transform_error(
        &mut self,
        mapping: &SimpleMapping,
        pipeline: &TransformPipeline,
        base: &str,
        raw_value: &TransformValue,
        err: FunctionError,
    ) -> Result<()> {
        if let Some(on_fail) = &mapping.on_fail {
            debug!(
                source = ?mapping.source_tag(),
                target = %mapping.target,
                on_fail = %on_fail,
                "transform failed, routed raw value to fallback target"
            );
            self.emitter.put_target(base, on_fail, raw_value);
            return Ok(());
        }
        if self.policy == TransformErrorPolicy::Fail {
            return Err(TransformError::Mapping {
                target: mapping.target.clone(),
                pipeline: pipeline.describe(),
                source: err,
            });
        }
        warn!(
            source = ?mapping.source_tag(),
            target = %mapping.target,
            transform = %pipeline.describe(),
            error = %err,
            "transform failed, mapping skipped"
        );
        self.diagnostics.push(TransformDiagnostic {
            source: mapping.source.clone(),
            target: mapping.target.clone(),
            message: err.to_string(),
        });
        Ok(())
    }
}

fn check_required(profile: &MappingProfile, emitter: &FlatEmitter) -> Result<()> {
    for validation in profile.validations.iter().filter(|v| v.required) {
        let full = emitter.absolute(&validation.path);
        if emitter.flat().has_value(&full) {
            continue;
        }
        let parent = full.rsplit_once('/').map_or("", |(parent, _)| parent);
        let mut nearby: Vec<String> = emitter
            .flat()
            .paths()
            .filter(|path| path.starts_with(parent))
            .map(str::to_string)
            .collect();
        nearby.sort();
        let truncated = nearby.len() > NEARBY_LIMIT;
        nearby.truncate(NEARBY_LIMIT);
        return Err(TransformError::RequiredPathMissing {
            required: validation.path.clone(),
            looked_at: full,
            nearby,
            truncated,
        });
    }
    Ok(())
}

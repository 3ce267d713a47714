use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use mtx_ingest::{DetectionError, detect, parse};
use mtx_model::{ValidationError, ValidationResult};
use mtx_standards::{FieldDefinitionsLoader, FillOnceCache, StandardsError};

use crate::prevalidate::rules::RuleSet;

/// `mt_type` reported when no type could be detected.
pub const UNKNOWN_TYPE: &str = "UNKNOWN";

/// Checks raw MT text against the field definitions for its type.
#[derive(Debug)]
pub struct PrevalidationEngine {
    loader: FieldDefinitionsLoader,
    rules: FillOnceCache<(), Arc<RuleSet>>,
}

impl PrevalidationEngine {
    pub fn new(loader: FieldDefinitionsLoader) -> Self {
        Self {
            loader,
            rules: FillOnceCache::new(),
        }
    }

    pub fn loader(&self) -> &FieldDefinitionsLoader {
        &self.loader
    }

    fn rules(&self) -> Result<Arc<RuleSet>, StandardsError> {
        self.rules.get_or_try_fill(&(), || {
            self.loader
                .lookups()
                .map(|lookups| Arc::new(RuleSet::new(lookups)))
        })
    }

    /// Presence checks for mandatory tags, then every rule on every occurrence.
    ///
    /// An undetectable type or a type without definitions is reported in the
    /// result. Only unreadable definition files are errors.
    pub fn validate(&self, raw: &str, force_type: Option<&str>) -> Result<ValidationResult, StandardsError> {
        let mt_type = match detect(raw, force_type) {
            Ok(mt_type) => mt_type,
            Err(DetectionError::Undetermined) => {
                return Ok(ValidationResult::new(
                    UNKNOWN_TYPE,
                    vec![ValidationError::message_level("Unable to detect MT type")],
                ));
            }
            Err(DetectionError::InvalidForcedType { value, .. }) => {
                return Ok(no_definitions(&value.to_uppercase()));
            }
        };

        let Some(definitions) = self.loader.definitions(mt_type.as_str())? else {
            return Ok(no_definitions(mt_type.as_str()));
        };
        let rules = self.rules()?;
        let message = parse(&mt_type, raw);
        let fields = message.fields();

        let mut errors = Vec::new();
        for definition in definitions.iter().filter(|d| d.is_mandatory() && !d.tag.trim().is_empty()) {
            let values = field_values(fields, &definition.tag);
            if values.iter().all(|value| value.trim().is_empty()) {
                errors.push(ValidationError::presence(definition.tag.clone()));
            }
        }

        for definition in definitions.iter().filter(|d| !d.validations.is_empty()) {
            for (index, value) in field_values(fields, &definition.tag).into_iter().enumerate() {
                for rule in definition.validations.iter().filter(|r| !r.rule_name.is_empty()) {
                    if let Some(message) = rules.apply(&rule.rule_name, value) {
                        errors.push(
                            ValidationError::new(definition.tag.clone(), message)
                                .with_code(rule.error_code.clone())
                                .at_occurrence(index + 1),
                        );
                    }
                }
            }
        }

        let result = ValidationResult::new(mt_type.as_str(), errors);
        info!(
            mt_type = %result.mt_type,
            valid = result.valid,
            errors = result.errors.len(),
            "prevalidation finished"
        );
        Ok(result)
    }
}

fn no_definitions(mt_type: &str) -> ValidationResult {
    debug!(mt_type, "no field definitions for type");
    ValidationResult::new(
        mt_type,
        vec![ValidationError::message_level(format!(
            "No field validations defined for {mt_type}"
        ))],
    )
}

/// Values of `tag`, falling back to option-lettered tags for a base tag.
///
/// `59` and `59a` both match whichever of `59A`, `59F`, ... is present.
pub fn field_values<'m>(fields: &'m BTreeMap<String, Vec<String>>, tag: &str) -> Vec<&'m str> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Vec::new();
    }
    let as_strs = |values: &'m Vec<String>| values.iter().map(String::as_str).collect::<Vec<_>>();

    let upper = tag.to_uppercase();
    if let Some(values) = fields.get(&upper).or_else(|| fields.get(tag)) {
        return as_strs(values);
    }

    let base = match tag.chars().last() {
        Some(last) if last.is_ascii_lowercase() && tag.len() > 2 => &upper[..upper.len() - 1],
        Some(_) if tag.chars().all(|c| c.is_ascii_digit()) => upper.as_str(),
        _ => return Vec::new(),
    };
    if let Some(values) = fields.get(base) {
        return as_strs(values);
    }
    fields
        .iter()
        .filter(|(key, _)| {
            key.len() == base.len() + 1
                && key.starts_with(base)
                && key.chars().last().is_some_and(|c| c.is_ascii_alphabetic())
        })
        .flat_map(|(_, values)| values.iter().map(String::as_str))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (tag, value) in pairs {
            map.entry((*tag).to_string()).or_default().push((*value).to_string());
        }
        map
    }

    #[test]
    fn option_letter_fallback() {
        let fields = fields(&[("59A", "BIC"), ("50K", "NAME"), ("50K", "NAME 2"), ("21", "R")]);
        assert_eq!(field_values(&fields, "59"), ["BIC"]);
        assert_eq!(field_values(&fields, "59a"), ["BIC"]);
        assert_eq!(field_values(&fields, "50k"), ["NAME", "NAME 2"]);
        assert_eq!(field_values(&fields, "21"), ["R"]);
        assert!(field_values(&fields, "59F").is_empty());
        assert!(field_values(&fields, "57").is_empty());
        assert!(field_values(&fields, " ").is_empty());
    }
}

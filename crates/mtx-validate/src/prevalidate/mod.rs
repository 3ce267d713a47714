//! MT prevalidation: mandatory-field presence and per-field value rules.

pub mod engine;
pub mod rules;

pub use crate::prevalidate::engine::{PrevalidationEngine, UNKNOWN_TYPE, field_values};
pub use crate::prevalidate::rules::{REASON_CODES_LOOKUP, Rule, RuleSet};

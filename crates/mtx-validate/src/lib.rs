//! Validation for the translator: XML Schema validation of generated MX
//! documents and rule-based prevalidation of incoming MT text.

pub mod config;
pub mod error;
pub mod prevalidate;
pub mod xsd;

pub use crate::config::{BackendKind, ValidatorConfig};
pub use crate::error::{SchemaError, ValidatorError, XmlError};
pub use crate::prevalidate::{PrevalidationEngine, RuleSet, UNKNOWN_TYPE};
pub use crate::xsd::{SchemaBackend, SchemaCache, XsdValidator, XsdVersion};

//! Shared data model for MT to MX translation.

pub mod error;
pub mod flat;
pub mod message;
pub mod outcome;
pub mod prevalidation;
pub mod profile;
pub mod routing;

pub use error::{ModelError, Result};
pub use flat::FlatDocument;
pub use message::{MessageType, ParsedMessage};
pub use outcome::{
    ConvertedMessage, NO_CONVERSION_APPLICABLE, PassThrough, Translation, ValidationOutcome,
};
pub use prevalidation::{
    FieldDefinition, FieldRule, MESSAGE_FIELD, PRESENCE_CODE, Presence, ValidationError,
    ValidationResult,
};
pub use profile::{
    AttributeValue, CaptureGroup, DEFAULT_MX_ROOT, DefaultValue, ErrorPolicies, ExistsProbe,
    MappingBlock, MappingEntry, MappingProfile, PathValidation, Scalar, SimpleMapping,
    SwitchBranch, SwitchMapping, TransformErrorPolicy, TransformPipeline, TransformStep,
    ValueExpr,
};
pub use routing::PairEntry;

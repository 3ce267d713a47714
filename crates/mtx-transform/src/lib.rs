//! Mapping profile interpreter.
//!
//! [`TransformEngine::apply`] evaluates a [`mtx_model::MappingProfile`]
//! against a [`mtx_model::ParsedMessage`] and produces the flat MX path
//! document consumed by the XML builder.

pub mod context;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod functions;

pub use context::TransformContext;
pub use emitter::FlatEmitter;
pub use engine::{TransformDiagnostic, TransformEngine, TransformOutput};
pub use error::{FunctionError, TransformError};
pub use functions::{TIMESTAMP_FORMAT, TransformValue};

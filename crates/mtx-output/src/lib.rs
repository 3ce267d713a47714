//! MX XML output.

pub mod builder;
pub mod error;
pub mod namespaces;

pub use builder::build;
pub use error::{BuildError, Result};
pub use namespaces::{ISO20022_URN_PREFIX, iso_urn, namespace_for, registered_types};

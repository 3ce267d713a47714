//! Loading of the on-disk standards tree: the routing catalog, mapping
//! profiles, prevalidation field definitions, and lookup tables.

pub mod cache;
pub mod error;
pub mod field_defs;
pub mod pairs;
pub mod paths;
pub mod relaxed_json;
pub mod store;

pub use crate::cache::FillOnceCache;
pub use crate::error::{Result, StandardsError};
pub use crate::field_defs::{FieldDefinitionsLoader, LookupTables, definition_folder};
pub use crate::pairs::PairTable;
pub use crate::paths::{
    STANDARDS_ENV_VAR, bundled_standards_root, prevalidate_dir, standards_root,
};
pub use crate::store::{LoadedProfile, MappingStore, read_profile};

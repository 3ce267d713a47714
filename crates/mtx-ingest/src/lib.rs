//! MT ingestion: type detection, block and tag parsing, variant
//! classification, and `.dat` batch splitting.

pub mod batch;
pub mod detector;
pub mod error;
pub mod parser;
pub mod variant;

pub use batch::{BatchFile, BatchMessage, parse_batch};
pub use detector::detect;
pub use error::{BatchError, DetectionError};
pub use parser::{parse, split_blocks};
pub use variant::classify as classify_variant;

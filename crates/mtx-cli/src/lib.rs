//! Translation pipeline, batch runner, and runtime plumbing for the `mtx` binary.

pub mod batch;
pub mod config;
pub mod logging;
pub mod pipeline;

pub use batch::{BatchEntry, BatchReport, EntryOutcome, run_batch, write_outputs};
pub use config::{FileConfig, Overrides, Settings};
pub use pipeline::{PipelineError, TranslateOptions, Translator};

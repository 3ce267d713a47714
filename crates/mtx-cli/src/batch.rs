//! Translation of `.dat` batch files over a bounded worker pool.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, info_span, warn};

use mtx_ingest::{BatchFile, BatchMessage};
use mtx_model::Translation;

use crate::pipeline::{PipelineError, TranslateOptions, Translator};

/// Outcome of one batch message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEntry {
    pub index: usize,
    #[serde(flatten)]
    pub outcome: EntryOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
    Ok { result: Translation },
    Error { error: EntryError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryError {
    pub status_code: u16,
    pub detail: Value,
}

impl From<&PipelineError> for EntryError {
    fn from(error: &PipelineError) -> Self {
        let detail = match error {
            PipelineError::Prevalidation(result) => json!({
                "message": error.to_string(),
                "result": result,
            }),
            other => Value::String(other.to_string()),
        };
        Self {
            status_code: error.status_code(),
            detail,
        }
    }
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, EntryOutcome::Ok { .. })
    }

    /// File name for this entry inside an output directory.
    pub fn file_name(&self) -> String {
        match &self.outcome {
            EntryOutcome::Ok { result } => match result.mx_type() {
                Some(mx_type) => format!("record-{:03}_{mx_type}.xml", self.index),
                None => format!("record-{:03}_pass_through.json", self.index),
            },
            EntryOutcome::Error { .. } => format!("record-{:03}_error.json", self.index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub source: String,
    pub header: BTreeMap<String, String>,
    pub trailer: BTreeMap<String, String>,
    pub summary: BatchCounts,
    pub processed_at: String,
    /// Sorted by message index.
    pub results: Vec<BatchEntry>,
}

/// Translate every message of `batch` using up to `workers` threads.
///
/// Failures are recorded per message and never stop the batch.
pub fn run_batch(
    translator: &Translator,
    batch: &BatchFile,
    workers: usize,
    options: &TranslateOptions,
) -> BatchReport {
    let span = info_span!("batch", source = %batch.source_name, messages = batch.messages.len());
    let _guard = span.enter();
    let now = options.now.unwrap_or_else(Utc::now);
    let workers = workers.min(batch.messages.len()).max(1);
    debug!(workers, "starting batch workers");

    let next = AtomicUsize::new(0);
    let (sender, receiver) = mpsc::channel();
    thread::scope(|scope| {
        for _ in 0..workers {
            let sender = sender.clone();
            let next = &next;
            scope.spawn(move || {
                while let Some(message) = batch.messages.get(next.fetch_add(1, Ordering::Relaxed)) {
                    let entry = translate_one(translator, message, options, now);
                    if sender.send(entry).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(sender);

    let mut results: Vec<BatchEntry> = receiver.into_iter().collect();
    results.sort_by_key(|entry| entry.index);

    let succeeded = results.iter().filter(|entry| entry.is_ok()).count();
    let summary = BatchCounts {
        total: batch.messages.len(),
        succeeded,
        failed: results.len() - succeeded,
    };
    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "batch finished"
    );
    BatchReport {
        source: batch.source_name.clone(),
        header: batch.header.clone(),
        trailer: batch.trailer.clone(),
        summary,
        processed_at: timestamp(now),
        results,
    }
}

fn translate_one(
    translator: &Translator,
    message: &BatchMessage,
    options: &TranslateOptions,
    now: DateTime<Utc>,
) -> BatchEntry {
    let span = info_span!("message", index = message.index);
    let _guard = span.enter();
    let options = TranslateOptions {
        request_id: options
            .request_id
            .as_ref()
            .map(|prefix| format!("{prefix}-{:03}", message.index)),
        now: Some(now),
        ..options.clone()
    };
    let outcome = match translator.translate(&message.mt_raw, &options) {
        Ok(result) => EntryOutcome::Ok { result },
        Err(error) => {
            warn!(status_code = error.status_code(), %error, "message failed");
            EntryOutcome::Error {
                error: EntryError::from(&error),
            }
        }
    };
    BatchEntry {
        index: message.index,
        outcome,
    }
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Write one file per entry plus `summary.json`; returns the written paths.
pub fn write_outputs(report: &BatchReport, output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output directory {}", output_dir.display()))?;

    let mut written = Vec::with_capacity(report.results.len() + 1);
    for entry in &report.results {
        let path = output_dir.join(entry.file_name());
        let contents = match &entry.outcome {
            EntryOutcome::Ok {
                result: Translation::Converted(converted),
            } => converted.xml.clone(),
            _ => serde_json::to_string_pretty(entry).context("serialize batch entry")?,
        };
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        written.push(path);
    }

    let summary_path = output_dir.join("summary.json");
    let summary = serde_json::to_string_pretty(report).context("serialize batch summary")?;
    fs::write(&summary_path, summary).with_context(|| format!("write {}", summary_path.display()))?;
    written.push(summary_path);
    debug!(files = written.len(), dir = %output_dir.display(), "wrote batch outputs");
    Ok(written)
}

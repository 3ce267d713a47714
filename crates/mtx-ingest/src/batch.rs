//! `.dat` batch files: a `HDR|` line, MT messages separated by `$` lines,
//! and a `TRL|` line.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::BatchError;

static MESSAGE_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\$\s*\n").expect("Invalid batch separator regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchMessage {
    /// Position in the batch, starting at 1.
    pub index: usize,
    pub mt_raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFile {
    pub source_name: String,
    pub header: BTreeMap<String, String>,
    pub trailer: BTreeMap<String, String>,
    pub messages: Vec<BatchMessage>,
}

pub fn parse_batch(text: &str, source_name: &str) -> Result<BatchFile, BatchError> {
    let normalized = text.replace("\r\n", "\n");
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return Err(BatchError::Empty {
            source_name: source_name.to_string(),
        });
    }

    let lines: Vec<&str> = normalized.lines().collect();
    let [header_line, body @ .., trailer_line] = lines.as_slice() else {
        return Err(BatchError::TooShort {
            source_name: source_name.to_string(),
        });
    };
    if body.is_empty() {
        return Err(BatchError::TooShort {
            source_name: source_name.to_string(),
        });
    }

    let header = parse_record(header_line, "HDR")?;
    let trailer = parse_record(trailer_line, "TRL")?;

    let body = body.join("\n");
    let messages: Vec<BatchMessage> = MESSAGE_SEPARATOR_RE
        .split(body.trim())
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .enumerate()
        .map(|(i, segment)| BatchMessage {
            index: i + 1,
            mt_raw: segment.to_string(),
        })
        .collect();

    if messages.is_empty() {
        return Err(BatchError::NoMessages {
            source_name: source_name.to_string(),
        });
    }

    debug!(source = source_name, messages = messages.len(), "split batch file");
    Ok(BatchFile {
        source_name: source_name.to_string(),
        header,
        trailer,
        messages,
    })
}

/// Parse `PREFIX|key=value|...`; segments without `=` are ignored.
fn parse_record(line: &str, expected: &'static str) -> Result<BTreeMap<String, String>, BatchError> {
    let line = line.trim();
    let mut parts = line.split('|');
    if parts.next() != Some(expected) {
        return Err(BatchError::UnexpectedRecord {
            expected,
            line: line.to_string(),
        });
    }
    Ok(parts
        .filter_map(|segment| segment.split_once('='))
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BATCH: &str = "HDR|BatchId=B1|CreateDate=2024-01-15\r\n{4:\n:20:ONE\n-}\n$\n{4:\n:20:TWO\n-}\n$ \n\n{4:\n:20:THREE\n-}\nTRL|Count=3\n";

    #[test]
    fn splits_messages_and_records() {
        let batch = parse_batch(BATCH, "in.dat").unwrap();
        assert_eq!(batch.header["BatchId"], "B1");
        assert_eq!(batch.header["CreateDate"], "2024-01-15");
        assert_eq!(batch.trailer["Count"], "3");
        let indices: Vec<usize> = batch.messages.iter().map(|m| m.index).collect();
        assert_eq!(indices, [1, 2, 3]);
        assert_eq!(batch.messages[1].mt_raw, "{4:\n:20:TWO\n-}");
    }

    #[test]
    fn rejects_missing_header() {
        let err = parse_batch("X|a=b\n{4:\n:20:A\n-}\nTRL|", "in.dat").unwrap_err();
        assert_eq!(
            err,
            BatchError::UnexpectedRecord {
                expected: "HDR",
                line: "X|a=b".to_string()
            }
        );
    }

    #[test]
    fn rejects_trivial_input() {
        assert!(matches!(parse_batch("  \n", "a.dat"), Err(BatchError::Empty { .. })));
        assert!(matches!(
            parse_batch("HDR|\nTRL|", "a.dat"),
            Err(BatchError::TooShort { .. })
        ));
        assert!(matches!(
            parse_batch("HDR|\n   \nTRL|", "a.dat"),
            Err(BatchError::NoMessages { .. })
        ));
    }
}

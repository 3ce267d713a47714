//! JSON loading that tolerates comments and trailing commas.
//!
//! Strict parsing is tried first. On failure, `/* */` block comments,
//! whole-line `//` comments and trailing commas before `}` or `]` are
//! removed and parsing is retried once. A persistent failure reports the
//! strict parser's position with two lines of context on either side.

use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, StandardsError};

static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid block comment regex"));

static LINE_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*//.*$").expect("Invalid line comment regex"));

static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("Invalid trailing comma regex"));

const CONTEXT_RADIUS: usize = 2;

/// Position and context of a JSON syntax error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonDiagnostic {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub context: String,
}

/// Remove comments and trailing commas.
pub fn relax(text: &str) -> String {
    let text = BLOCK_COMMENT_RE.replace_all(text, "");
    let text = LINE_COMMENT_RE.replace_all(&text, "");
    TRAILING_COMMA_RE.replace_all(&text, "$1").into_owned()
}

/// Parse `text` strictly, then relaxed.
pub fn parse_relaxed(text: &str) -> std::result::Result<Value, JsonDiagnostic> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let strict_err = match serde_json::from_str(text) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    match serde_json::from_str(&relax(text)) {
        Ok(value) => {
            debug!(error = %strict_err, "parsed JSON after removing comments");
            Ok(value)
        }
        Err(_) => Err(diagnose(text, &strict_err)),
    }
}

/// Read and parse a mapping file.
pub fn load_json(path: &Path) -> Result<Value> {
    let bytes = std::fs::read(path).map_err(|e| StandardsError::io(path, e))?;
    let text: Cow<'_, str> = String::from_utf8_lossy(&bytes);
    parse_relaxed(&text).map_err(|diag| StandardsError::MappingJson {
        path: path.to_path_buf(),
        line: diag.line,
        column: diag.column,
        message: diag.message,
        context: diag.context,
    })
}

fn diagnose(text: &str, err: &serde_json::Error) -> JsonDiagnostic {
    let lines: Vec<&str> = text.lines().collect();
    let line = err.line().max(1);
    let start = line.saturating_sub(CONTEXT_RADIUS + 1);
    let end = lines.len().min(line + CONTEXT_RADIUS);
    let context = (start..end)
        .map(|i| format!("{:>5}: {}", i + 1, lines[i]))
        .collect::<Vec<_>>()
        .join("\n");
    JsonDiagnostic {
        line: err.line(),
        column: err.column(),
        message: message_without_position(err),
        context,
    }
}

/// serde_json appends " at line L column C"; the diagnostic carries those separately.
fn message_without_position(err: &serde_json::Error) -> String {
    let full = err.to_string();
    match full.rfind(" at line ") {
        Some(idx) => full[..idx].to_string(),
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_json_passes_through() {
        let value = parse_relaxed(r#"{"a": "http://x/y", "b": [1, 2]}"#).unwrap();
        assert_eq!(value["a"], "http://x/y");
    }

    #[test]
    fn comments_and_trailing_commas_are_tolerated() {
        let text = "\u{feff}{\n  // routing note\n  \"a\": 1, /* inline */\n  \"b\": [1, 2,],\n}\n";
        let value = parse_relaxed(text).unwrap();
        assert_eq!(value["a"], 1);
        assert_eq!(value["b"], serde_json::json!([1, 2]));
    }

    #[test]
    fn persistent_errors_carry_context() {
        let text = "{\n  \"a\": 1,\n  \"b\": ,\n  \"c\": 3\n}\n";
        let diag = parse_relaxed(text).unwrap_err();
        assert_eq!(diag.line, 3);
        assert!(diag.column > 0);
        assert_eq!(
            diag.context,
            "    1: {\n    2:   \"a\": 1,\n    3:   \"b\": ,\n    4:   \"c\": 3\n    5: }"
        );
        assert!(!diag.message.contains("at line"));
    }
}

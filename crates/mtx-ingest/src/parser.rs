//! SWIFT block and block 4 tag parsing.
//!
//! Parsing never fails: text without blocks or tags yields an empty field
//! map, and downstream stages treat absence as data.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use mtx_model::{MessageType, ParsedMessage};

static FIELD_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^:(\d{2}[A-Z]?):").expect("Invalid field tag regex"));

const BLOCK_TERMINATOR: &str = "-}";
const TEXT_BLOCK_END: &str = "\n-}";

/// Split `raw` into blocks and parse block 4 (or the whole text) into tags.
pub fn parse(mt_type: &MessageType, raw: &str) -> ParsedMessage {
    let blocks = split_blocks(raw);
    let body = blocks.get("4").map_or(raw, String::as_str);

    let markers: Vec<(String, usize, usize)> = FIELD_TAG_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let tag = caps.get(1)?;
            Some((tag.as_str().to_string(), whole.start(), whole.end()))
        })
        .collect();

    let occurrences: Vec<(String, String)> = markers
        .iter()
        .enumerate()
        .map(|(i, (tag, _, value_start))| {
            let value_end = markers.get(i + 1).map_or(body.len(), |next| next.1);
            (tag.clone(), clean_value(&body[*value_start..value_end]))
        })
        .collect();

    trace!(
        mt_type = %mt_type,
        blocks = blocks.len(),
        tags = occurrences.len(),
        "parsed MT message"
    );
    ParsedMessage::new(mt_type.clone(), blocks, occurrences)
}

/// Extract top-level `{N:...}` blocks; nested braces stay inside their block.
///
/// Block 4 ends at its `\n-}` terminator whatever braces its text holds. An
/// unterminated block ends the scan.
pub fn split_blocks(raw: &str) -> BTreeMap<String, String> {
    let bytes = raw.as_bytes();
    let mut blocks = BTreeMap::new();
    let mut i = 0;
    while i + 2 < bytes.len() {
        let opens_block = bytes[i] == b'{' && bytes[i + 1].is_ascii_digit() && bytes[i + 2] == b':';
        if !opens_block {
            i += 1;
            continue;
        }
        let body_start = i + 3;
        let text_block_end = (bytes[i + 1] == b'4')
            .then(|| raw[body_start..].find(TEXT_BLOCK_END))
            .flatten()
            .map(|offset| body_start + offset + TEXT_BLOCK_END.len() - 1);
        let Some(j) = text_block_end.or_else(|| matching_brace(bytes, body_start)) else {
            break;
        };
        let number = char::from(bytes[i + 1]).to_string();
        blocks.insert(number, raw[body_start..j].to_string());
        i = j + 1;
    }
    blocks
}

/// Index of the `}` closing a block whose body starts at `start`.
fn matching_brace(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (offset, byte) in bytes[start..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn clean_value(segment: &str) -> String {
    let mut value = strip_terminator(segment.trim()).to_string();
    if value.contains('\n') {
        let lines: Vec<&str> = value.lines().collect();
        if lines.last().is_some_and(|line| line.trim() == "-") {
            value = lines[..lines.len() - 1].join("\n").trim_end().to_string();
        }
    }
    strip_terminator(&value).to_string()
}

fn strip_terminator(value: &str) -> &str {
    value
        .strip_suffix(BLOCK_TERMINATOR)
        .map_or(value, str::trim_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mt(code: &str) -> MessageType {
        MessageType::new(code).unwrap()
    }

    #[test]
    fn block_four_tags_are_trimmed() {
        let raw = "{1:F01BANKBEBBAXXX0000000000}{2:I103BANKDEFFXXXXN}{4:\n:20:REF-1\n:32A:240115EUR1234,56\n:59:/DE44500105175407324931\nJOHN DOE\n-}";
        let msg = parse(&mt("MT103"), raw);
        assert_eq!(msg.first("20"), Some("REF-1"));
        assert_eq!(msg.first("32A"), Some("240115EUR1234,56"));
        assert_eq!(msg.first("59"), Some("/DE44500105175407324931\nJOHN DOE"));
        assert_eq!(msg.block("2"), Some("I103BANKDEFFXXXXN"));
    }

    #[test]
    fn nested_block_three_is_kept_whole() {
        let blocks = split_blocks("{1:F01X}{3:{108:MUR}{119:STP}}{4:\n:20:A\n-}{5:{CHK:ABC}}");
        assert_eq!(blocks["3"], "{108:MUR}{119:STP}");
        assert_eq!(blocks["5"], "{CHK:ABC}");
        assert_eq!(blocks["4"], "\n:20:A\n-");
    }

    #[test]
    fn text_without_block_four_is_scanned_whole() {
        let msg = parse(&mt("MT940"), ":20:STMT\n:25:ACC-1\n:61:X\n-}");
        assert_eq!(msg.first("25"), Some("ACC-1"));
        assert_eq!(msg.first("61"), Some("X"));
    }

    #[test]
    fn lone_hyphen_line_is_dropped() {
        let msg = parse(&mt("MT103"), ":70:LINE ONE\nLINE TWO\n-\n");
        assert_eq!(msg.first("70"), Some("LINE ONE\nLINE TWO"));
    }

    #[test]
    fn markers_only_count_at_line_start() {
        let msg = parse(&mt("MT103"), ":72:/INS/X:21:Y\n:21:REL\n");
        assert_eq!(msg.first("72"), Some("/INS/X:21:Y"));
        assert_eq!(msg.values("21"), ["REL"]);
    }

    #[test]
    fn stray_brace_in_text_block_keeps_trailer_out() {
        let raw = "{1:F01BANKBEBBAXXX0000000000}{2:I103BANKDEFFXXXXN}{4:\n:20:REF-1\n:70:INVOICE {42\n-}{5:{CHK:123456789ABC}}";
        let msg = parse(&mt("MT103"), raw);
        assert_eq!(msg.first("70"), Some("INVOICE {42"));
        assert_eq!(msg.blocks().get("5").map(String::as_str), Some("{CHK:123456789ABC}"));
    }

    #[test]
    fn garbage_parses_to_nothing() {
        let msg = parse(&mt("MT103"), "not a swift message {");
        assert!(msg.is_empty());
        assert!(msg.blocks().is_empty());
    }
}

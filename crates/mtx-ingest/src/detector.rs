//! MT message type detection.
//!
//! The block 2 application header is authoritative when present. Without
//! it, the type is guessed from the set of tags in the text.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use mtx_model::MessageType;

use crate::error::{DetectionError, Result};

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{2:[IO](\d{3})").expect("Invalid block 2 header regex"));

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":(\d{2}[A-Z]?):").expect("Invalid tag regex"));

const COVER_PAYER_TAGS: [&str; 3] = ["50A", "50F", "50K"];

/// Tag-set heuristics for header-less text, checked in order.
const HEURISTICS: &[(&str, &[&str], &[&str])] = &[
    ("MT103", &["20", "23B", "32A", "50K", "59", "71A"], &[]),
    ("MT202", &["20", "21", "32A"], &["57A", "57D"]),
    ("MT940", &["25", "28C", "61"], &[]),
    // Weak: any statement-like text with 25 and 61 lands here.
    ("MT910", &["25", "61"], &[]),
];

/// Classify raw MT text; a non-empty `forced` type always wins.
pub fn detect(raw: &str, forced: Option<&str>) -> Result<MessageType> {
    if let Some(forced) = forced.map(str::trim).filter(|f| !f.is_empty()) {
        return MessageType::new(forced).map_err(|source| DetectionError::InvalidForcedType {
            value: forced.to_string(),
            source,
        });
    }

    let tags: BTreeSet<&str> = TAG_RE
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    if let Some(caps) = HEADER_RE.captures(raw) {
        let digits = caps.get(1).map_or("", |m| m.as_str());
        let mt = MessageType::from_number(digits).map_err(|_| DetectionError::Undetermined)?;
        if mt == "MT202" && is_cover(&tags) {
            debug!(header = "202", "cover payer and beneficiary present, refined to MT202COV");
            return Ok(MessageType::from_static("MT202COV"));
        }
        return Ok(mt);
    }

    for (code, required, any_of) in HEURISTICS {
        let all_present = required.iter().all(|tag| tags.contains(tag));
        let one_present = any_of.is_empty() || any_of.iter().any(|tag| tags.contains(tag));
        if all_present && one_present {
            debug!(mt_type = *code, "detected from tag heuristics");
            return Ok(MessageType::from_static(*code));
        }
    }

    Err(DetectionError::Undetermined)
}

fn is_cover(tags: &BTreeSet<&str>) -> bool {
    COVER_PAYER_TAGS.iter().any(|tag| tags.contains(tag))
        && tags.iter().any(|tag| tag.starts_with("59"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_type_is_upper_cased() {
        assert_eq!(detect("anything", Some(" mt199 ")).unwrap(), "MT199");
    }

    #[test]
    fn empty_forced_type_is_ignored() {
        let raw = "{2:I940BANKDEFFXXXXN}{4:\n:20:X\n-}";
        assert_eq!(detect(raw, Some("")).unwrap(), "MT940");
    }

    #[test]
    fn header_beats_heuristics() {
        let raw = "{2:O1031200BANKBEBBAXXX}{4:\n:25:ACC\n:61:X\n-}";
        assert_eq!(detect(raw, None).unwrap(), "MT103");
    }

    #[test]
    fn heuristics_in_order() {
        let mt103 = ":20:R\n:23B:CRED\n:32A:240101EUR1,\n:50K:A\n:59:B\n:71A:SHA\n";
        assert_eq!(detect(mt103, None).unwrap(), "MT103");
        let mt202 = ":20:R\n:21:R2\n:32A:240101EUR1,\n:57D:BANK\n";
        assert_eq!(detect(mt202, None).unwrap(), "MT202");
        let mt940 = ":20:R\n:25:ACC\n:28C:1/1\n:61:X\n";
        assert_eq!(detect(mt940, None).unwrap(), "MT940");
        let mt910 = ":20:R\n:25:ACC\n:61:X\n";
        assert_eq!(detect(mt910, None).unwrap(), "MT910");
    }

    #[test]
    fn nothing_matches() {
        assert!(matches!(
            detect("hello world", None),
            Err(DetectionError::Undetermined)
        ));
    }
}

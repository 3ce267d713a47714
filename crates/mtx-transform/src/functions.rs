//! The transform function library.
//!
//! Every function maps one text value to a value or an error. Pipelines
//! over lists apply each function element-wise.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;

use mtx_model::CaptureGroup;

use crate::error::FunctionError;

/// Timestamp format used by `now`, `$now` and the `MsgId` fallback.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const IBAN_MIN_LEN: usize = 15;
const IBAN_MAX_LEN: usize = 34;

/// A value flowing through a transform pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformValue {
    Absent,
    Text(String),
    /// Produced by `lines`; emitted as one element per item.
    List(Vec<String>),
}

impl TransformValue {
    pub fn from_option(value: Option<&str>) -> Self {
        value.map_or(Self::Absent, |v| Self::Text(v.to_string()))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Apply a fallible text function to every present element.
    pub(crate) fn try_map(
        self,
        mut f: impl FnMut(&str) -> Result<Option<String>, FunctionError>,
    ) -> Result<Self, FunctionError> {
        match self {
            Self::Absent => Ok(Self::Absent),
            Self::Text(text) => Ok(f(&text)?.map_or(Self::Absent, Self::Text)),
            Self::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in &items {
                    if let Some(mapped) = f(item)? {
                        out.push(mapped);
                    }
                }
                Ok(Self::List(out))
            }
        }
    }
}

/// SWIFT comma-decimal to dot-decimal (`12345,67` -> `12345.67`).
pub fn to_decimal(value: &str) -> String {
    let compact: String = value.trim().chars().filter(|c| *c != ' ').collect();
    if !compact.contains('.')
        && let Some((int_part, frac_part)) = compact.split_once(',')
        && !frac_part.is_empty()
        && frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return format!("{}.{frac_part}", int_part.replace(['.', ','], ""));
    }
    compact.replace(',', "")
}

/// Parse a date token with a strftime-style `format` and render `YYYY-MM-DD`.
///
/// Two-digit years `00..=68` land in 2000-2068 and `69..=99` in 1969-1999.
pub fn date_parse(value: &str, format: &str) -> Result<String, FunctionError> {
    NaiveDate::parse_from_str(value, format)
        .map(|date| pivot_two_digit_year(date, format))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|_| FunctionError::DateParse {
            value: value.to_string(),
            format: format.to_string(),
        })
}

// chrono maps `%y` 69 to 2069; the pivot year belongs to the 1900s.
fn pivot_two_digit_year(date: NaiveDate, format: &str) -> NaiveDate {
    if format.contains("%y") && date.year() == 2069 {
        date.with_year(1969).unwrap_or(date)
    } else {
        date
    }
}

pub fn iban_normalize(value: &str) -> Result<String, FunctionError> {
    let iban: String = value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if (IBAN_MIN_LEN..=IBAN_MAX_LEN).contains(&iban.len()) {
        Ok(iban)
    } else {
        Err(FunctionError::Iban { length: iban.len() })
    }
}

/// Split into trimmed, non-blank lines.
pub fn lines(value: &str) -> Vec<String> {
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keep at most `max` characters.
pub fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

pub fn upper(value: &str) -> String {
    value.to_uppercase()
}

pub fn now(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// MT field 71A charge codes to ISO 20022 `ChrgBr`.
pub fn charge_code(value: &str) -> String {
    let code = value.trim().to_uppercase();
    match code.as_str() {
        "BEN" => "DEBT".to_string(),
        "OUR" => "CRED".to_string(),
        "SHA" => "SHAR".to_string(),
        _ => code,
    }
}

/// First match of `pattern` in `value`, narrowed to `group`.
///
/// No match, or a group that did not participate, yields `None`.
pub fn regex_extract(
    value: &str,
    pattern: &Regex,
    group: &CaptureGroup,
) -> Result<Option<String>, FunctionError> {
    let Some(caps) = pattern.captures(value) else {
        return Ok(None);
    };
    let found = match group {
        CaptureGroup::Index(index) => {
            if *index >= pattern.captures_len() {
                return Err(FunctionError::UnknownGroup {
                    group: index.to_string(),
                });
            }
            caps.get(*index)
        }
        CaptureGroup::Name(name) => {
            if !pattern.capture_names().flatten().any(|n| n == name) {
                return Err(FunctionError::UnknownGroup {
                    group: name.clone(),
                });
            }
            caps.name(name)
        }
    };
    Ok(found.map(|m| m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use regex::RegexBuilder;

    fn pattern(p: &str) -> Regex {
        RegexBuilder::new(p)
            .multi_line(true)
            .dot_matches_new_line(true)
            .build()
            .unwrap()
    }

    #[test]
    fn decimal_normalisation() {
        assert_eq!(to_decimal("12345,67"), "12345.67");
        assert_eq!(to_decimal("1000,"), "1000");
        assert_eq!(to_decimal(" 1 000,5 "), "1000.5");
        assert_eq!(to_decimal("1,234.50"), "1234.50");
        assert_eq!(to_decimal("12,3a"), "123a");
    }

    #[test]
    fn dates_use_the_requested_format() {
        assert_eq!(date_parse("240115", "%y%m%d").unwrap(), "2024-01-15");
        assert_eq!(date_parse("20240115", "%Y%m%d").unwrap(), "2024-01-15");
        assert!(date_parse("240230", "%y%m%d").is_err());
        assert!(date_parse("240115EUR", "%y%m%d").is_err());
    }

    #[test]
    fn two_digit_years_pivot_at_69() {
        assert_eq!(date_parse("680301", "%y%m%d").unwrap(), "2068-03-01");
        assert_eq!(date_parse("690301", "%y%m%d").unwrap(), "1969-03-01");
        assert_eq!(date_parse("991231", "%y%m%d").unwrap(), "1999-12-31");
        assert_eq!(date_parse("20690301", "%Y%m%d").unwrap(), "2069-03-01");
    }

    #[test]
    fn iban_normalisation() {
        assert_eq!(
            iban_normalize(" DE44 5001 0517 5407 3249 31 ").unwrap(),
            "DE44500105175407324931"
        );
        assert_eq!(
            iban_normalize("/de44-5001-0517-5407-3249-31").unwrap(),
            "DE44500105175407324931"
        );
        assert!(matches!(
            iban_normalize("DE44 5001"),
            Err(FunctionError::Iban { length: 8 })
        ));
    }

    #[test]
    fn text_helpers() {
        assert_eq!(lines(" A \n\n B\r\n"), ["A", "B"]);
        assert_eq!(truncate("ÄBCDEF", 3), "ÄBC");
        assert_eq!(truncate("AB", 140), "AB");
        assert_eq!(charge_code(" sha "), "SHAR");
        assert_eq!(charge_code("BEN"), "DEBT");
        assert_eq!(charge_code("OUR"), "CRED");
        assert_eq!(charge_code("XYZ"), "XYZ");
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        assert_eq!(now(at), "2024-01-15T09:30:00Z");
    }

    #[test]
    fn regex_groups() {
        let amount = pattern(r"^(?P<date>\d{6})(?P<ccy>[A-Z]{3})(?P<amt>[\d,]+)$");
        let value = "240115EUR1234,56";
        let named = CaptureGroup::Name("ccy".to_string());
        assert_eq!(regex_extract(value, &amount, &named).unwrap().as_deref(), Some("EUR"));
        let whole = CaptureGroup::Index(0);
        assert_eq!(regex_extract(value, &amount, &whole).unwrap().as_deref(), Some(value));
        assert_eq!(regex_extract("nope", &amount, &whole).unwrap(), None);
        assert!(regex_extract(value, &amount, &CaptureGroup::Index(9)).is_err());
        assert!(regex_extract(value, &amount, &CaptureGroup::Name("x".into())).is_err());
    }

    #[test]
    fn regex_is_multiline() {
        let second_line = pattern(r"^NAME (.+)$");
        let group = CaptureGroup::Index(1);
        assert_eq!(
            regex_extract("/123\nNAME ACME", &second_line, &group).unwrap().as_deref(),
            Some("ACME")
        );
    }

    #[test]
    fn lists_map_element_wise() {
        let value = TransformValue::List(vec!["a".into(), "b".into()]);
        let mapped = value.try_map(|s| Ok(Some(upper(s)))).unwrap();
        assert_eq!(mapped, TransformValue::List(vec!["A".into(), "B".into()]));
        assert_eq!(
            TransformValue::Absent.try_map(|s| Ok(Some(upper(s)))).unwrap(),
            TransformValue::Absent
        );
    }
}

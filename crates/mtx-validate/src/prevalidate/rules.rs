//! Value-level field rules.
//!
//! Every rule takes one field occurrence and returns the failure message, or
//! `None` when the value is acceptable.

use std::sync::{Arc, LazyLock};

use chrono::NaiveDate;
use regex::Regex;

use mtx_standards::LookupTables;

/// Lookup table consulted by the MT n96 answer rule.
pub const REASON_CODES_LOOKUP: &str = "mt196_reason_codes";

const MAX_DECIMAL_DIGITS: usize = 15;

const X_CHARSET_PUNCTUATION: &str = "/ -?:().,'+\r\n";

static LEADING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{8}|\d{6})").expect("Invalid leading date regex"));

static CURRENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{3}").expect("Invalid currency regex"));

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+)(?:[,.][0-9]*)?$").expect("Invalid amount regex")
});

static THREE_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3}$").expect("Invalid MT number regex"));

static SIX_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}$").expect("Invalid YYMMDD regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    SlashBoundaries,
    LeadingDate,
    CurrencyPresent,
    AmountIntegerDigit,
    DecimalCommaMandatory,
    DecimalPrecision,
    NoPayeeAccount,
    XCharset,
    MtNumberAndDate,
    ReasonCodes,
}

const RULE_NAMES: [(&str, Rule); 10] = [
    ("no_leading_or_trailing_slash_or_double_slash", Rule::SlashBoundaries),
    ("must_be_valid_date_yymmdd", Rule::LeadingDate),
    ("currency_must_be_valid_iso4217", Rule::CurrencyPresent),
    ("amount_integer_part_at_least_one_digit", Rule::AmountIntegerDigit),
    ("amount_decimal_comma_mandatory", Rule::DecimalCommaMandatory),
    ("amount_decimal_places_within_currency_precision", Rule::DecimalPrecision),
    ("payee_account_must_not_be_present", Rule::NoPayeeAccount),
    ("value_must_use_x_charset", Rule::XCharset),
    ("mt_number_and_date", Rule::MtNumberAndDate),
    ("mt196_rjcr_pdcr_reason_codes", Rule::ReasonCodes),
];

impl Rule {
    pub fn from_name(name: &str) -> Option<Self> {
        RULE_NAMES
            .iter()
            .find(|(rule_name, _)| *rule_name == name)
            .map(|(_, rule)| *rule)
    }

    pub fn name(self) -> &'static str {
        RULE_NAMES
            .iter()
            .find(|(_, rule)| *rule == self)
            .map_or("unknown", |(name, _)| *name)
    }
}

/// The rule catalog bound to one set of lookup tables.
#[derive(Debug, Clone)]
pub struct RuleSet {
    lookups: Arc<LookupTables>,
    reason_codes: Option<Regex>,
}

impl RuleSet {
    pub fn new(lookups: Arc<LookupTables>) -> Self {
        let reason_codes = lookups
            .codes(REASON_CODES_LOOKUP)
            .filter(|codes| !codes.is_empty())
            .and_then(|codes| reason_code_pattern(codes.iter().map(String::as_str)));
        Self {
            lookups,
            reason_codes,
        }
    }

    pub fn lookups(&self) -> &LookupTables {
        &self.lookups
    }

    /// Apply the rule called `name`. Unknown rules always pass.
    pub fn apply(&self, name: &str, value: &str) -> Option<String> {
        let rule = Rule::from_name(name)?;
        self.apply_rule(rule, value)
    }

    pub fn apply_rule(&self, rule: Rule, value: &str) -> Option<String> {
        match rule {
            Rule::SlashBoundaries => slash_boundaries(value),
            Rule::LeadingDate => leading_date(value),
            Rule::CurrencyPresent => currency_present(value),
            Rule::AmountIntegerDigit => amount_integer_digit(value),
            Rule::DecimalCommaMandatory => decimal_comma_mandatory(value),
            Rule::DecimalPrecision => decimal_precision(value),
            Rule::NoPayeeAccount => no_payee_account(value),
            Rule::XCharset => x_charset(value),
            Rule::MtNumberAndDate => mt_number_and_date(value),
            Rule::ReasonCodes => reason_codes(self.reason_codes.as_ref(), value),
        }
    }
}

/// `\b(CODE|...)\b`, longest codes first.
fn reason_code_pattern<'a>(codes: impl Iterator<Item = &'a str>) -> Option<Regex> {
    let mut codes: Vec<&str> = codes.collect();
    codes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternatives: Vec<String> = codes.into_iter().map(regex::escape).collect();
    Regex::new(&format!(r"\b({})\b", alternatives.join("|"))).ok()
}

pub fn slash_boundaries(value: &str) -> Option<String> {
    let trimmed = value.trim();
    for line in trimmed.lines() {
        if line.starts_with('/') {
            return Some("Value must not start with '/'".to_string());
        }
        if line.ends_with('/') {
            return Some("Value must not end with '/'".to_string());
        }
        if line.contains("//") {
            return Some("Value must not contain consecutive slashes".to_string());
        }
    }
    None
}

pub fn leading_date(value: &str) -> Option<String> {
    let Some(token) = LEADING_DATE.captures(value).and_then(|c| c.get(1)) else {
        return Some("Expected leading date in YYMMDD or YYYYMMDD format".to_string());
    };
    let token = token.as_str();
    let format = if token.len() == 6 { "%y%m%d" } else { "%Y%m%d" };
    match NaiveDate::parse_from_str(token, format) {
        Ok(_) => None,
        Err(_) => Some("Invalid date value".to_string()),
    }
}

pub fn currency_present(value: &str) -> Option<String> {
    (!CURRENCY.is_match(value)).then(|| "Currency code not found".to_string())
}

pub fn amount_integer_digit(value: &str) -> Option<String> {
    (!AMOUNT.is_match(value.trim())).then(|| "Missing integer amount component".to_string())
}

pub fn decimal_comma_mandatory(value: &str) -> Option<String> {
    (!value.contains(',')).then(|| "Decimal comma is mandatory".to_string())
}

pub fn decimal_precision(value: &str) -> Option<String> {
    let (_, decimals) = value.split_once(',')?;
    let digits = decimals.chars().filter(char::is_ascii_digit).count();
    (digits > MAX_DECIMAL_DIGITS).then(|| format!("Decimal part exceeds {MAX_DECIMAL_DIGITS} digits"))
}

pub fn no_payee_account(value: &str) -> Option<String> {
    let first_line = value.trim().lines().next().unwrap_or_default();
    first_line
        .starts_with('/')
        .then(|| "Account line is not permitted".to_string())
}

pub fn x_charset(value: &str) -> Option<String> {
    value
        .chars()
        .find(|ch| !ch.is_ascii_alphanumeric() && !X_CHARSET_PUNCTUATION.contains(*ch))
        .map(|ch| format!("Character '{ch}' not allowed in X charset"))
}

/// `<MT number> <YYMMDD>`, as in field 11S/11R.
pub fn mt_number_and_date(value: &str) -> Option<String> {
    let mut tokens = value.split_whitespace();
    let (Some(mt_code), Some(date)) = (tokens.next(), tokens.next()) else {
        return Some("Expected MT number and YYMMDD date".to_string());
    };
    if !THREE_DIGITS.is_match(mt_code) {
        return Some("MT number must be three digits".to_string());
    }
    let in_range = mt_code
        .parse::<u16>()
        .is_ok_and(|number| (100..=999).contains(&number));
    if !in_range {
        return Some("MT number must be between 100 and 999".to_string());
    }
    if !SIX_DIGITS.is_match(date) {
        return Some("Date must be expressed as YYMMDD".to_string());
    }
    match NaiveDate::parse_from_str(date, "%y%m%d") {
        Ok(_) => None,
        Err(_) => Some("Invalid date value".to_string()),
    }
}

/// An answer reporting `RJCR` or `PDCR` must carry a known reason code.
fn reason_codes(pattern: Option<&Regex>, value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    let text = value.to_uppercase();
    if !text.contains("RJCR") && !text.contains("PDCR") {
        return None;
    }
    let pattern = pattern?;
    (!pattern.is_match(&text))
        .then(|| "Reason code required when RJCR or PDCR is reported".to_string())
}

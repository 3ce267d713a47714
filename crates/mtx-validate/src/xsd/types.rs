//! Built-in simple types and constraining facets.

use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

macro_rules! lexical {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("Invalid lexical regex"));
    };
}

lexical!(DECIMAL, r"^[+-]?(\d+(\.\d*)?|\.\d+)$");
lexical!(INTEGER, r"^[+-]?\d+$");
lexical!(FLOATING, r"^([+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?|[+-]?INF|NaN)$");
lexical!(
    DATE,
    r"^(\d{4})-(\d{2})-(\d{2})(Z|[+-]\d{2}:\d{2})?$"
);
lexical!(
    DATE_TIME,
    r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(\.\d+)?(Z|[+-]\d{2}:\d{2})?$"
);
lexical!(TIME, r"^(\d{2}):(\d{2}):(\d{2})(\.\d+)?(Z|[+-]\d{2}:\d{2})?$");
lexical!(G_YEAR, r"^-?\d{4,}(Z|[+-]\d{2}:\d{2})?$");
lexical!(G_YEAR_MONTH, r"^-?\d{4,}-(0[1-9]|1[0-2])(Z|[+-]\d{2}:\d{2})?$");
lexical!(G_MONTH, r"^--(0[1-9]|1[0-2])(Z|[+-]\d{2}:\d{2})?$");
lexical!(G_MONTH_DAY, r"^--(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])(Z|[+-]\d{2}:\d{2})?$");
lexical!(G_DAY, r"^---(0[1-9]|[12]\d|3[01])(Z|[+-]\d{2}:\d{2})?$");
lexical!(
    DURATION,
    r"^-?P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$"
);
lexical!(NAME, r"^[A-Za-z_:][A-Za-z0-9_:.\-]*$");
lexical!(NC_NAME, r"^[A-Za-z_][A-Za-z0-9_.\-]*$");
lexical!(LANGUAGE, r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$");
lexical!(BASE64, r"^[A-Za-z0-9+/= ]*$");
lexical!(HEX, r"^([0-9a-fA-F]{2})*$");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    Preserve,
    Replace,
    Collapse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    AnySimpleType,
    String,
    NormalizedString,
    Token,
    Language,
    Name,
    NcName,
    Id,
    IdRef,
    AnyUri,
    Base64Binary,
    HexBinary,
    Boolean,
    Decimal,
    Integer,
    NonNegativeInteger,
    PositiveInteger,
    NonPositiveInteger,
    NegativeInteger,
    Long,
    Int,
    Short,
    Byte,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    Double,
    Float,
    Date,
    DateTime,
    Time,
    GYear,
    GYearMonth,
    GMonth,
    GMonthDay,
    GDay,
    Duration,
}

const BUILTINS: &[(&str, Builtin)] = &[
    ("anySimpleType", Builtin::AnySimpleType),
    ("string", Builtin::String),
    ("normalizedString", Builtin::NormalizedString),
    ("token", Builtin::Token),
    ("language", Builtin::Language),
    ("Name", Builtin::Name),
    ("NCName", Builtin::NcName),
    ("ID", Builtin::Id),
    ("IDREF", Builtin::IdRef),
    ("anyURI", Builtin::AnyUri),
    ("base64Binary", Builtin::Base64Binary),
    ("hexBinary", Builtin::HexBinary),
    ("boolean", Builtin::Boolean),
    ("decimal", Builtin::Decimal),
    ("integer", Builtin::Integer),
    ("nonNegativeInteger", Builtin::NonNegativeInteger),
    ("positiveInteger", Builtin::PositiveInteger),
    ("nonPositiveInteger", Builtin::NonPositiveInteger),
    ("negativeInteger", Builtin::NegativeInteger),
    ("long", Builtin::Long),
    ("int", Builtin::Int),
    ("short", Builtin::Short),
    ("byte", Builtin::Byte),
    ("unsignedLong", Builtin::UnsignedLong),
    ("unsignedInt", Builtin::UnsignedInt),
    ("unsignedShort", Builtin::UnsignedShort),
    ("unsignedByte", Builtin::UnsignedByte),
    ("double", Builtin::Double),
    ("float", Builtin::Float),
    ("date", Builtin::Date),
    ("dateTime", Builtin::DateTime),
    ("time", Builtin::Time),
    ("gYear", Builtin::GYear),
    ("gYearMonth", Builtin::GYearMonth),
    ("gMonth", Builtin::GMonth),
    ("gMonthDay", Builtin::GMonthDay),
    ("gDay", Builtin::GDay),
    ("duration", Builtin::Duration),
];

impl Builtin {
    pub fn from_local(name: &str) -> Option<Self> {
        BUILTINS
            .iter()
            .find(|(local, _)| *local == name)
            .map(|(_, builtin)| *builtin)
    }

    pub fn name(self) -> &'static str {
        BUILTINS
            .iter()
            .find(|(_, builtin)| *builtin == self)
            .map_or("anySimpleType", |(local, _)| local)
    }

    pub fn whitespace(self) -> WhiteSpace {
        match self {
            Self::String | Self::AnySimpleType => WhiteSpace::Preserve,
            Self::NormalizedString => WhiteSpace::Replace,
            _ => WhiteSpace::Collapse,
        }
    }

    pub fn normalize(self, raw: &str) -> String {
        match self.whitespace() {
            WhiteSpace::Preserve => raw.to_string(),
            WhiteSpace::Replace => raw.replace(['\t', '\n', '\r'], " "),
            WhiteSpace::Collapse => raw.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }

    fn is_decimal_family(self) -> bool {
        matches!(
            self,
            Self::Decimal
                | Self::Integer
                | Self::NonNegativeInteger
                | Self::PositiveInteger
                | Self::NonPositiveInteger
                | Self::NegativeInteger
                | Self::Long
                | Self::Int
                | Self::Short
                | Self::Byte
                | Self::UnsignedLong
                | Self::UnsignedInt
                | Self::UnsignedShort
                | Self::UnsignedByte
        )
    }

    fn integer_bounds(self) -> Option<(i128, i128)> {
        Some(match self {
            Self::Long => (i64::MIN.into(), i64::MAX.into()),
            Self::Int => (i32::MIN.into(), i32::MAX.into()),
            Self::Short => (i16::MIN.into(), i16::MAX.into()),
            Self::Byte => (i8::MIN.into(), i8::MAX.into()),
            Self::UnsignedLong => (0, u64::MAX.into()),
            Self::UnsignedInt => (0, u32::MAX.into()),
            Self::UnsignedShort => (0, u16::MAX.into()),
            Self::UnsignedByte => (0, u8::MAX.into()),
            _ => return None,
        })
    }

    /// Check the lexical form of an already normalised value.
    pub fn check(self, value: &str) -> Result<(), String> {
        let valid = match self {
            Self::AnySimpleType
            | Self::String
            | Self::NormalizedString
            | Self::Token
            | Self::AnyUri => true,
            Self::Language => LANGUAGE.is_match(value),
            Self::Name => NAME.is_match(value),
            Self::NcName | Self::Id | Self::IdRef => NC_NAME.is_match(value),
            Self::Base64Binary => {
                BASE64.is_match(value) && value.chars().filter(|c| *c != ' ').count() % 4 == 0
            }
            Self::HexBinary => HEX.is_match(value),
            Self::Boolean => matches!(value, "true" | "false" | "1" | "0"),
            Self::Decimal => DECIMAL.is_match(value),
            Self::Double | Self::Float => FLOATING.is_match(value),
            Self::Date => DATE.captures(value).is_some_and(|c| valid_date(&c[1], &c[2], &c[3])),
            Self::DateTime => DATE_TIME.captures(value).is_some_and(|c| {
                valid_date(&c[1], &c[2], &c[3]) && valid_time(&c[4], &c[5], &c[6])
            }),
            Self::Time => TIME
                .captures(value)
                .is_some_and(|c| valid_time(&c[1], &c[2], &c[3])),
            Self::GYear => G_YEAR.is_match(value),
            Self::GYearMonth => G_YEAR_MONTH.is_match(value),
            Self::GMonth => G_MONTH.is_match(value),
            Self::GMonthDay => G_MONTH_DAY.is_match(value),
            Self::GDay => G_DAY.is_match(value),
            Self::Duration => {
                DURATION.is_match(value) && !value.ends_with('P') && !value.ends_with('T')
            }
            Self::Integer
            | Self::NonNegativeInteger
            | Self::PositiveInteger
            | Self::NonPositiveInteger
            | Self::NegativeInteger
            | Self::Long
            | Self::Int
            | Self::Short
            | Self::Byte
            | Self::UnsignedLong
            | Self::UnsignedInt
            | Self::UnsignedShort
            | Self::UnsignedByte => INTEGER.is_match(value) && self.integer_in_range(value),
        };
        if valid {
            Ok(())
        } else {
            Err(format!(
                "'{value}' is not a valid value of the atomic type 'xs:{}'.",
                self.name()
            ))
        }
    }

    fn integer_in_range(self, value: &str) -> bool {
        let sign = compare_decimal(value, "0");
        match self {
            Self::Integer => true,
            Self::NonNegativeInteger => sign != Some(Ordering::Less),
            Self::PositiveInteger => sign == Some(Ordering::Greater),
            Self::NonPositiveInteger => sign != Some(Ordering::Greater),
            Self::NegativeInteger => sign == Some(Ordering::Less),
            _ => self.integer_bounds().is_some_and(|(min, max)| {
                value
                    .trim_start_matches('+')
                    .parse::<i128>()
                    .is_ok_and(|n| (min..=max).contains(&n))
            }),
        }
    }

    /// Order two values of this type, where an order is defined.
    pub fn compare(self, a: &str, b: &str) -> Option<Ordering> {
        if self.is_decimal_family() {
            return compare_decimal(a, b);
        }
        match self {
            Self::Double | Self::Float => {
                let a: f64 = a.parse().ok()?;
                let b: f64 = b.parse().ok()?;
                a.partial_cmp(&b)
            }
            Self::Date
            | Self::DateTime
            | Self::Time
            | Self::GYear
            | Self::GYearMonth
            | Self::GMonth
            | Self::GMonthDay
            | Self::GDay => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn valid_date(year: &str, month: &str, day: &str) -> bool {
    let (Ok(year), Ok(month), Ok(day)) =
        (year.parse::<i32>(), month.parse::<u32>(), day.parse::<u32>())
    else {
        return false;
    };
    NaiveDate::from_ymd_opt(year, month, day).is_some()
}

fn valid_time(hour: &str, minute: &str, second: &str) -> bool {
    let (Ok(hour), Ok(minute), Ok(second)) =
        (hour.parse::<u32>(), minute.parse::<u32>(), second.parse::<u32>())
    else {
        return false;
    };
    (hour < 24 && minute < 60 && second < 60) || (hour == 24 && minute == 0 && second == 0)
}

/// A decimal split into sign, integer digits without leading zeros, and
/// fraction digits without trailing zeros.
#[derive(Debug, PartialEq, Eq)]
struct DecimalParts {
    negative: bool,
    int: String,
    frac: String,
}

impl DecimalParts {
    fn parse(value: &str) -> Option<Self> {
        if !DECIMAL.is_match(value) {
            return None;
        }
        let (negative, digits) = match value.as_bytes().first() {
            Some(b'-') => (true, &value[1..]),
            Some(b'+') => (false, &value[1..]),
            _ => (false, value),
        };
        let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
        let int = int.trim_start_matches('0').to_string();
        let frac = frac.trim_end_matches('0').to_string();
        let zero = int.is_empty() && frac.is_empty();
        Some(Self {
            negative: negative && !zero,
            int,
            frac,
        })
    }

    fn magnitude_cmp(&self, other: &Self) -> Ordering {
        self.int
            .len()
            .cmp(&other.int.len())
            .then_with(|| self.int.cmp(&other.int))
            .then_with(|| self.frac.cmp(&other.frac))
    }
}

pub fn compare_decimal(a: &str, b: &str) -> Option<Ordering> {
    let a = DecimalParts::parse(a)?;
    let b = DecimalParts::parse(b)?;
    Some(match (a.negative, b.negative) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.magnitude_cmp(&b),
        (true, true) => b.magnitude_cmp(&a),
    })
}

/// Facets of one restriction step. Patterns within a step are alternatives.
#[derive(Debug, Default)]
pub struct Facets {
    pub enumeration: Vec<String>,
    pub patterns: Vec<(String, Regex)>,
    pub length: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub total_digits: Option<usize>,
    pub fraction_digits: Option<usize>,
    pub min_inclusive: Option<String>,
    pub max_inclusive: Option<String>,
    pub min_exclusive: Option<String>,
    pub max_exclusive: Option<String>,
}

impl Facets {
    pub fn check(&self, value: &str, base: Builtin) -> Result<(), String> {
        self.check_length(value, base)?;

        if !self.patterns.is_empty() && !self.patterns.iter().any(|(_, re)| re.is_match(value)) {
            let shown: Vec<&str> = self.patterns.iter().map(|(p, _)| p.as_str()).collect();
            return Err(format!(
                "[facet 'pattern'] The value '{value}' is not accepted by the pattern '{}'.",
                shown.join("|")
            ));
        }

        if !self.enumeration.is_empty() && !self.enumeration.iter().any(|e| e == value) {
            let set: Vec<String> = self.enumeration.iter().map(|e| format!("'{e}'")).collect();
            return Err(format!(
                "[facet 'enumeration'] The value '{value}' is not an element of the set {{{}}}.",
                set.join(", ")
            ));
        }

        if self.total_digits.is_some() || self.fraction_digits.is_some() {
            if let Some(parts) = DecimalParts::parse(value) {
                if let Some(total) = self.total_digits
                    && parts.int.len() + parts.frac.len() > total
                {
                    return Err(format!(
                        "[facet 'totalDigits'] The value '{value}' has more digits than are allowed ('{total}')."
                    ));
                }
                if let Some(fraction) = self.fraction_digits
                    && parts.frac.len() > fraction
                {
                    return Err(format!(
                        "[facet 'fractionDigits'] The value '{value}' has more fractional digits than are allowed ('{fraction}')."
                    ));
                }
            }
        }

        self.check_range(value, base)
    }

    fn check_length(&self, value: &str, base: Builtin) -> Result<(), String> {
        if self.length.is_none() && self.min_length.is_none() && self.max_length.is_none() {
            return Ok(());
        }
        let length = match base {
            Builtin::HexBinary => value.len() / 2,
            Builtin::Base64Binary => {
                let chars = value.chars().filter(|c| *c != ' ' && *c != '=').count();
                chars * 3 / 4
            }
            _ => value.chars().count(),
        };
        if let Some(expected) = self.length
            && length != expected
        {
            return Err(format!(
                "[facet 'length'] The value has a length of '{length}'; this differs from the allowed length of '{expected}'."
            ));
        }
        if let Some(min) = self.min_length
            && length < min
        {
            return Err(format!(
                "[facet 'minLength'] The value has a length of '{length}'; this underruns the allowed minimum length of '{min}'."
            ));
        }
        if let Some(max) = self.max_length
            && length > max
        {
            return Err(format!(
                "[facet 'maxLength'] The value has a length of '{length}'; this exceeds the allowed maximum length of '{max}'."
            ));
        }
        Ok(())
    }

    fn check_range(&self, value: &str, base: Builtin) -> Result<(), String> {
        let bounds = [
            (
                "minInclusive",
                &self.min_inclusive,
                (Ordering::Less, Ordering::Less),
                "is less than the minimum value allowed",
            ),
            (
                "maxInclusive",
                &self.max_inclusive,
                (Ordering::Greater, Ordering::Greater),
                "is greater than the maximum value allowed",
            ),
            (
                "minExclusive",
                &self.min_exclusive,
                (Ordering::Less, Ordering::Equal),
                "must be greater than",
            ),
            (
                "maxExclusive",
                &self.max_exclusive,
                (Ordering::Greater, Ordering::Equal),
                "must be less than",
            ),
        ];
        for (facet, bound, (outside, edge), text) in bounds {
            let Some(bound) = bound else { continue };
            if let Some(order) = base.compare(value, bound)
                && (order == outside || order == edge)
            {
                return Err(format!(
                    "[facet '{facet}'] The value '{value}' {text} ('{bound}')."
                ));
            }
        }
        Ok(())
    }
}

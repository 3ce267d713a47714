//! Typed AST for declarative mapping profiles.
//!
//! A profile is loaded from JSON and describes how MT fields populate MX
//! paths. The loose JSON shapes (`"transform": "upper"`,
//! `{"fn": ..., "args": ...}`, lists of either, simple vs `switch` entries)
//! are resolved into tagged variants at load time so evaluation can match
//! exhaustively.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ModelError;

/// Root element under `Document` used when a profile does not name one.
pub const DEFAULT_MX_ROOT: &str = "FIToFICstmrCdtTrf";

/// Prefix of attribute values that read an MT field.
const MT_FIELD_PREFIX: &str = "$mt.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingProfile {
    #[serde(default)]
    pub meta: ProfileMeta,
    #[serde(default)]
    pub mx_root: Option<String>,
    /// Root-level defaults in file order.
    #[serde(default, deserialize_with = "ordered_entries")]
    pub defaults: Vec<(String, DefaultValue)>,
    #[serde(default)]
    pub blocks: Vec<MappingBlock>,
    #[serde(default)]
    pub validations: Vec<PathValidation>,
    #[serde(default)]
    pub error_policies: ErrorPolicies,
}

impl MappingProfile {
    pub fn mx_root(&self) -> &str {
        self.meta
            .mx_root
            .as_deref()
            .or(self.mx_root.as_deref())
            .filter(|root| !root.is_empty())
            .unwrap_or(DEFAULT_MX_ROOT)
    }

    pub fn transform_error_policy(&self) -> TransformErrorPolicy {
        self.error_policies.on_transform_error
    }

    /// Number of mapping entries across all blocks, switch branches included.
    pub fn entry_count(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|block| &block.mappings)
            .map(|entry| match entry {
                MappingEntry::Simple(_) => 1,
                MappingEntry::Switch(switch) => {
                    switch
                        .branches
                        .iter()
                        .map(|branch| branch.mappings.len())
                        .sum::<usize>()
                        + switch.default.len()
                }
            })
            .sum()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfileMeta {
    #[serde(default)]
    pub mx_root: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorPolicies {
    #[serde(default)]
    pub on_transform_error: TransformErrorPolicy,
}

/// What happens when a transform fails and the entry has no `on_fail` target.
///
/// `WarnAndCopyRaw` drops the entry; the raw value is only copied when the
/// entry names an `on_fail` path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformErrorPolicy {
    Fail,
    #[default]
    #[serde(other)]
    WarnAndCopyRaw,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PathValidation {
    pub path: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MappingBlock {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub target_root: Option<String>,
    #[serde(default)]
    pub mappings: Vec<MappingEntry>,
}

impl MappingBlock {
    pub fn base(&self) -> &str {
        self.target_root.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub enum MappingEntry {
    Simple(SimpleMapping),
    Switch(SwitchMapping),
}

impl<'de> Deserialize<'de> for MappingEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        MappingEntry::try_from(value).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Value> for MappingEntry {
    type Error = ModelError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let is_switch = value.as_object().is_some_and(|obj| obj.contains_key("switch"));
        if is_switch {
            serde_json::from_value(value)
                .map(MappingEntry::Switch)
                .map_err(|e| ModelError::InvalidMapping(format!("switch entry: {e}")))
        } else {
            serde_json::from_value(value)
                .map(MappingEntry::Simple)
                .map_err(|e| ModelError::InvalidMapping(e.to_string()))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimpleMapping {
    #[serde(default)]
    pub source: Option<String>,
    pub target: String,
    #[serde(default)]
    pub transform: Option<TransformPipeline>,
    #[serde(default)]
    pub on_fail: Option<String>,
    #[serde(default, deserialize_with = "ordered_entries")]
    pub attributes: Vec<(String, AttributeValue)>,
    #[serde(default)]
    pub value: Option<Scalar>,
}

impl SimpleMapping {
    /// The MT tag named by `source`, without any `.suffix`.
    pub fn source_tag(&self) -> Option<&str> {
        self.source
            .as_deref()
            .map(|source| source.split_once('.').map_or(source, |(tag, _)| tag))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchMapping {
    #[serde(default)]
    pub when_any: Vec<ExistsProbe>,
    #[serde(rename = "switch")]
    pub branches: Vec<SwitchBranch>,
    #[serde(default)]
    pub default: Vec<SimpleMapping>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchBranch {
    #[serde(rename = "if")]
    pub condition: ExistsProbe,
    #[serde(default)]
    pub mappings: Vec<SimpleMapping>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExistsProbe {
    #[serde(default)]
    pub exists: String,
}

impl ExistsProbe {
    pub fn tag(&self) -> &str {
        self.exists.split_once('.').map_or(&self.exists, |(tag, _)| tag)
    }
}

/// A JSON scalar rendered as text (`12` -> `"12"`, `true` -> `"true"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct Scalar(pub String);

impl From<Value> for Scalar {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Scalar(s),
            Value::Null => Scalar(String::new()),
            other => Scalar(other.to_string()),
        }
    }
}

impl Scalar {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Right-hand side of a profile default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExpr {
    /// `$now`: the transformation timestamp.
    Now,
    /// `$context.request_id`.
    RequestId,
    Literal(String),
}

impl From<Scalar> for ValueExpr {
    fn from(Scalar(text): Scalar) -> Self {
        match text.as_str() {
            "$now" => ValueExpr::Now,
            "$context.request_id" => ValueExpr::RequestId,
            _ => ValueExpr::Literal(text),
        }
    }
}

/// A default entry, written either as `{"value": ...}` or as a bare scalar.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct DefaultValue {
    pub value: Option<ValueExpr>,
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        let value = match value {
            Value::Object(mut obj) => obj.remove("value"),
            other => Some(other),
        };
        let value = value
            .filter(|v| !v.is_null())
            .map(|v| ValueExpr::from(Scalar::from(v)));
        DefaultValue { value }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Scalar")]
pub enum AttributeValue {
    Literal(String),
    /// `$mt.<tag>`: first occurrence of an MT field.
    MtField(String),
}

impl From<Scalar> for AttributeValue {
    fn from(Scalar(text): Scalar) -> Self {
        match text.strip_prefix(MT_FIELD_PREFIX) {
            Some(tag) => AttributeValue::MtField(tag.to_string()),
            None => AttributeValue::Literal(text),
        }
    }
}

/// Capture group selector for `regex_extract`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureGroup {
    Index(usize),
    Name(String),
}

/// One named transform function with its resolved arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformStep {
    ToDecimal,
    DateParse { format: String },
    IbanNormalize,
    Lines,
    Truncate { max: usize },
    Upper,
    Now,
    ChargeCode,
    RegexExtract { pattern: String, group: CaptureGroup },
}

const DEFAULT_DATE_FORMAT: &str = "%y%m%d";
const DEFAULT_TRUNCATE_MAX: usize = 140;

impl TransformStep {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToDecimal => "to_decimal",
            Self::DateParse { .. } => "date_parse",
            Self::IbanNormalize => "iban_normalize",
            Self::Lines => "lines",
            Self::Truncate { .. } => "truncate",
            Self::Upper => "upper",
            Self::Now => "now",
            Self::ChargeCode => "charge_code",
            Self::RegexExtract { .. } => "regex_extract",
        }
    }

    pub fn parse(name: &str, args: &Map<String, Value>) -> Result<Self, ModelError> {
        let step = match name {
            "to_decimal" => Self::ToDecimal,
            "date_parse" => Self::DateParse {
                format: string_arg(args, "format")?
                    .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
            },
            "iban_normalize" => Self::IbanNormalize,
            "lines" => Self::Lines,
            "truncate" => Self::Truncate {
                max: usize_arg(args, "max")?.unwrap_or(DEFAULT_TRUNCATE_MAX),
            },
            "upper" => Self::Upper,
            "now" => Self::Now,
            "charge_code" => Self::ChargeCode,
            "regex_extract" => {
                let pattern = string_arg(args, "pattern")?
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| {
                        ModelError::InvalidTransform("regex_extract requires 'pattern'".into())
                    })?;
                let group = match args.get("group") {
                    None | Some(Value::Null) => CaptureGroup::Index(0),
                    Some(Value::Number(n)) => CaptureGroup::Index(
                        n.as_u64()
                            .and_then(|n| usize::try_from(n).ok())
                            .ok_or_else(|| {
                                ModelError::InvalidTransform(format!("invalid group {n}"))
                            })?,
                    ),
                    Some(Value::String(s)) => match s.parse::<usize>() {
                        Ok(index) => CaptureGroup::Index(index),
                        Err(_) => CaptureGroup::Name(s.clone()),
                    },
                    Some(other) => {
                        return Err(ModelError::InvalidTransform(format!(
                            "invalid group {other}"
                        )));
                    }
                };
                Self::RegexExtract { pattern, group }
            }
            other => {
                return Err(ModelError::InvalidTransform(format!(
                    "unknown transform: {other}"
                )));
            }
        };
        Ok(step)
    }

    fn from_value(value: &Value) -> Result<Self, ModelError> {
        match value {
            Value::String(name) => Self::parse(name, &Map::new()),
            Value::Object(obj) => {
                let name = obj.get("fn").and_then(Value::as_str).ok_or_else(|| {
                    ModelError::InvalidTransform(format!("transform object without 'fn': {value}"))
                })?;
                let empty = Map::new();
                let args = match obj.get("args") {
                    Some(Value::Object(args)) => args,
                    None | Some(Value::Null) => &empty,
                    Some(other) => {
                        return Err(ModelError::InvalidTransform(format!(
                            "{name}: args must be an object, got {other}"
                        )));
                    }
                };
                Self::parse(name, args)
            }
            other => Err(ModelError::InvalidTransform(format!(
                "unsupported transform spec: {other}"
            ))),
        }
    }
}

fn string_arg(args: &Map<String, Value>, key: &str) -> Result<Option<String>, ModelError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ModelError::InvalidTransform(format!(
            "argument '{key}' must be a string, got {other}"
        ))),
    }
}

fn usize_arg(args: &Map<String, Value>, key: &str) -> Result<Option<usize>, ModelError> {
    let parsed = match args.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse::<usize>().ok(),
        Some(_) => None,
    };
    parsed.map(Some).ok_or_else(|| {
        ModelError::InvalidTransform(format!("argument '{key}' must be a non-negative integer"))
    })
}

/// A transform applied left to right; a single step is a one-element pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformPipeline(pub Vec<TransformStep>);

impl TransformPipeline {
    pub fn steps(&self) -> &[TransformStep] {
        &self.0
    }

    pub fn describe(&self) -> String {
        self.0
            .iter()
            .map(TransformStep::name)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

impl TryFrom<Value> for TransformPipeline {
    type Error = ModelError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let steps = match &value {
            Value::Array(items) => items
                .iter()
                .map(TransformStep::from_value)
                .collect::<Result<Vec<_>, _>>()?,
            single => vec![TransformStep::from_value(single)?],
        };
        Ok(TransformPipeline(steps))
    }
}

impl<'de> Deserialize<'de> for TransformPipeline {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        TransformPipeline::try_from(value).map_err(serde::de::Error::custom)
    }
}

/// Deserialize a JSON object into `(key, value)` pairs, keeping file order.
fn ordered_entries<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct OrderedVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object")
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, V>()? {
                entries.push((key, value));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_any(OrderedVisitor(PhantomData))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transform_accepts_name_object_and_pipeline() {
        let single: TransformPipeline = serde_json::from_value(json!("to_decimal")).unwrap();
        assert_eq!(single.steps(), [TransformStep::ToDecimal]);

        let object: TransformPipeline =
            serde_json::from_value(json!({"fn": "truncate", "args": {"max": "35"}})).unwrap();
        assert_eq!(object.steps(), [TransformStep::Truncate { max: 35 }]);

        let pipeline: TransformPipeline = serde_json::from_value(json!([
            {"fn": "regex_extract", "args": {"pattern": "^(?P<d>\\d{6})", "group": "d"}},
            "date_parse"
        ]))
        .unwrap();
        assert_eq!(pipeline.describe(), "regex_extract -> date_parse");
        assert_eq!(
            pipeline.steps()[1],
            TransformStep::DateParse {
                format: "%y%m%d".to_string()
            }
        );
    }

    #[test]
    fn unknown_transform_is_rejected_at_load() {
        let err = serde_json::from_value::<TransformPipeline>(json!("rot13")).unwrap_err();
        assert!(err.to_string().contains("unknown transform: rot13"));
    }

    #[test]
    fn regex_extract_requires_pattern() {
        let err = serde_json::from_value::<TransformPipeline>(json!({"fn": "regex_extract"}))
            .unwrap_err();
        assert!(err.to_string().contains("requires 'pattern'"));
    }

    #[test]
    fn entries_split_into_simple_and_switch() {
        let profile: MappingProfile = serde_json::from_value(json!({
            "meta": {"mx_root": "FICdtTrf"},
            "defaults": {
                "GrpHdr/MsgId": {"value": "$context.request_id"},
                "GrpHdr/CreDtTm": {"value": "$now"},
                "GrpHdr/NbOfTxs": {"value": 1}
            },
            "blocks": [{
                "target_root": "CdtTrfTxInf",
                "mappings": [
                    {"source": "20", "target": "PmtId/InstrId"},
                    {
                        "when_any": [{"exists": "50K"}],
                        "switch": [{"if": {"exists": "50K"}, "mappings": [
                            {"source": "50K", "target": "Dbtr/Nm"}
                        ]}],
                        "default": [{"value": "NOTPROVIDED", "target": "Dbtr/Nm"}]
                    }
                ]
            }],
            "validations": [{"path": "GrpHdr/MsgId", "required": true}],
            "error_policies": {"on_transform_error": "fail"}
        }))
        .unwrap();

        assert_eq!(profile.mx_root(), "FICdtTrf");
        assert_eq!(profile.transform_error_policy(), TransformErrorPolicy::Fail);
        let keys: Vec<&str> = profile.defaults.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["GrpHdr/MsgId", "GrpHdr/CreDtTm", "GrpHdr/NbOfTxs"]);
        assert_eq!(profile.defaults[0].1.value, Some(ValueExpr::RequestId));
        assert_eq!(profile.defaults[1].1.value, Some(ValueExpr::Now));
        assert_eq!(
            profile.defaults[2].1.value,
            Some(ValueExpr::Literal("1".to_string()))
        );
        assert!(matches!(profile.blocks[0].mappings[0], MappingEntry::Simple(_)));
        assert!(matches!(profile.blocks[0].mappings[1], MappingEntry::Switch(_)));
        assert_eq!(profile.entry_count(), 3);
    }

    #[test]
    fn unknown_policy_falls_back_to_warn() {
        let policies: ErrorPolicies =
            serde_json::from_value(json!({"on_transform_error": "shrug"})).unwrap();
        assert_eq!(
            policies.on_transform_error,
            TransformErrorPolicy::WarnAndCopyRaw
        );
    }

    #[test]
    fn attribute_values_resolve_mt_lookups() {
        let mapping: SimpleMapping = serde_json::from_value(json!({
            "source": "32A.amount",
            "target": "IntrBkSttlmAmt",
            "attributes": {"Ccy": "$mt.33B", "Src": "MT"}
        }))
        .unwrap();
        assert_eq!(mapping.source_tag(), Some("32A"));
        assert_eq!(
            mapping.attributes,
            vec![
                ("Ccy".to_string(), AttributeValue::MtField("33B".to_string())),
                ("Src".to_string(), AttributeValue::Literal("MT".to_string())),
            ]
        );
    }

    #[test]
    fn default_profile_root() {
        let profile: MappingProfile = serde_json::from_value(json!({})).unwrap();
        assert_eq!(profile.mx_root(), DEFAULT_MX_ROOT);
        assert_eq!(
            profile.transform_error_policy(),
            TransformErrorPolicy::WarnAndCopyRaw
        );
    }
}

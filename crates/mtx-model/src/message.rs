//! MT message identity and the parsed block/tag representation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// An MT message type code such as `MT103` or `MT202COV`.
///
/// Codes are always stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageType(String);

impl MessageType {
    pub fn new(code: impl AsRef<str>) -> Result<Self> {
        let code = code.as_ref().trim().to_uppercase();
        if code.is_empty() {
            return Err(ModelError::InvalidMessageType(code));
        }
        Ok(Self(code))
    }

    /// Wrap a code literal that is already upper-cased.
    pub fn from_static(code: &'static str) -> Self {
        Self(code.to_string())
    }

    /// Build a type from the three digits of a block 2 header.
    pub fn from_number(digits: &str) -> Result<Self> {
        if digits.len() != 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModelError::InvalidMessageType(digits.to_string()));
        }
        Ok(Self(format!("MT{digits}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The code without its `MT` prefix (`MT103` -> `103`).
    pub fn number(&self) -> &str {
        self.0.strip_prefix("MT").unwrap_or(&self.0)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for MessageType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MessageType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A raw MT message split into blocks, with block 4 parsed into tags.
///
/// Built once per message and never mutated afterwards. A tag may repeat;
/// occurrences keep their encounter order, and `tag_order` records every
/// occurrence in the order it appeared in the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedMessage {
    declared_type: MessageType,
    blocks: BTreeMap<String, String>,
    fields: BTreeMap<String, Vec<String>>,
    tag_order: Vec<String>,
}

impl ParsedMessage {
    /// Assemble a message from its blocks and its `(tag, value)` occurrences.
    pub fn new<I>(declared_type: MessageType, blocks: BTreeMap<String, String>, occurrences: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut tag_order = Vec::new();
        for (tag, value) in occurrences {
            tag_order.push(tag.clone());
            fields.entry(tag).or_default().push(value);
        }
        Self {
            declared_type,
            blocks,
            fields,
            tag_order,
        }
    }

    /// Convenience constructor for block-less messages.
    pub fn from_fields<I, T, V>(declared_type: MessageType, occurrences: I) -> Self
    where
        I: IntoIterator<Item = (T, V)>,
        T: Into<String>,
        V: Into<String>,
    {
        Self::new(
            declared_type,
            BTreeMap::new(),
            occurrences
                .into_iter()
                .map(|(tag, value)| (tag.into(), value.into())),
        )
    }

    pub fn declared_type(&self) -> &MessageType {
        &self.declared_type
    }

    pub fn blocks(&self) -> &BTreeMap<String, String> {
        &self.blocks
    }

    pub fn block(&self, number: &str) -> Option<&str> {
        self.blocks.get(number).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    pub fn tag_order(&self) -> &[String] {
        &self.tag_order
    }

    /// All occurrences of a tag, empty when absent.
    pub fn values(&self, tag: &str) -> &[String] {
        self.fields.get(tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First occurrence of a tag.
    pub fn first(&self, tag: &str) -> Option<&str> {
        self.values(tag).first().map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.fields.contains_key(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_is_upper_cased() {
        let mt = MessageType::new(" mt202cov ").unwrap();
        assert_eq!(mt.as_str(), "MT202COV");
        assert_eq!(mt.number(), "202COV");
    }

    #[test]
    fn from_number_rejects_non_digits() {
        assert!(MessageType::from_number("10A").is_err());
        assert_eq!(MessageType::from_number("940").unwrap(), "MT940");
    }

    #[test]
    fn repeated_tags_keep_encounter_order() {
        let msg = ParsedMessage::from_fields(
            MessageType::new("MT102").unwrap(),
            [("20", "REF"), ("21", "A"), ("32B", "EUR1,"), ("21", "B")],
        );
        assert_eq!(msg.values("21"), ["A", "B"]);
        assert_eq!(msg.first("21"), Some("A"));
        assert_eq!(msg.tag_order(), ["20", "21", "32B", "21"]);
        assert!(msg.values("59").is_empty());
    }
}

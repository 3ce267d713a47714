//! The flat XPath -> values document produced by a transformation.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered map of absolute paths to emitted values.
///
/// Paths keep the order in which they were first written, which is the
/// order elements are created when the document is rendered. Each path's
/// values keep emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatDocument {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl FlatDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one value to `path`, creating the path if needed.
    pub fn push(&mut self, path: impl Into<String>, value: impl Into<String>) {
        let path = path.into();
        let value = value.into();
        match self.index.get(&path) {
            Some(&slot) => self.entries[slot].1.push(value),
            None => {
                self.index.insert(path.clone(), self.entries.len());
                self.entries.push((path, vec![value]));
            }
        }
    }

    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.index
            .get(path)
            .map(|&slot| self.entries[slot].1.as_slice())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// True when `path` carries at least one non-empty value.
    pub fn has_value(&self, path: &str) -> bool {
        self.get(path)
            .is_some_and(|values| values.iter().any(|v| !v.is_empty()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(path, values)| (path.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FlatDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, values) in &self.entries {
            map.serialize_entry(path, values)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_insertion_order() {
        let mut doc = FlatDocument::new();
        doc.push("/Document/A/B", "1");
        doc.push("/Document/A/C", "2");
        doc.push("/Document/A/B", "3");

        let paths: Vec<&str> = doc.paths().collect();
        assert_eq!(paths, ["/Document/A/B", "/Document/A/C"]);
        assert_eq!(doc.get("/Document/A/B").unwrap(), ["1", "3"]);
    }

    #[test]
    fn empty_values_do_not_count_as_present() {
        let mut doc = FlatDocument::new();
        doc.push("/Document/A", "");
        assert!(doc.contains("/Document/A"));
        assert!(!doc.has_value("/Document/A"));
    }

    #[test]
    fn serializes_as_ordered_map() {
        let mut doc = FlatDocument::new();
        doc.push("/z", "1");
        doc.push("/a", "2");
        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json, r#"{"/z":["1"],"/a":["2"]}"#);
    }
}

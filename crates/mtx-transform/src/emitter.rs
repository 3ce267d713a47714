//! Collects emitted values into a [`FlatDocument`] rooted at `/Document/<mx_root>`.

use mtx_model::FlatDocument;

use crate::functions::TransformValue;

#[derive(Debug)]
pub struct FlatEmitter {
    root: String,
    flat: FlatDocument,
}

impl FlatEmitter {
    pub fn new(mx_root: &str) -> Self {
        Self {
            root: mx_root.to_string(),
            flat: FlatDocument::new(),
        }
    }

    /// Absolute path of a root-relative path.
    pub fn absolute(&self, rel: &str) -> String {
        if rel.is_empty() {
            format!("/Document/{}", self.root)
        } else {
            format!("/Document/{}/{rel}", self.root)
        }
    }

    /// Write `value` to `rel`; lists emit one value per item, absent emits nothing.
    pub fn put(&mut self, rel: &str, value: &TransformValue) {
        match value {
            TransformValue::Absent => {}
            TransformValue::Text(text) => {
                let path = self.absolute(rel);
                self.flat.push(path, text.as_str());
            }
            TransformValue::List(items) => {
                let path = self.absolute(rel);
                for item in items {
                    self.flat.push(path.clone(), item.as_str());
                }
            }
        }
    }

    pub fn put_attr(&mut self, rel_parent: &str, attr: &str, value: &TransformValue) {
        if value.is_absent() {
            return;
        }
        self.put(&format!("{rel_parent}/@{attr}"), value);
    }

    /// Route `value` to a target that may end in `/@attr`.
    pub fn put_target(&mut self, base: &str, target: &str, value: &TransformValue) {
        match target.split_once("/@") {
            Some((parent, attr)) => self.put_attr(&join(base, parent), attr, value),
            None => self.put(&join(base, target), value),
        }
    }

    pub fn flat(&self) -> &FlatDocument {
        &self.flat
    }

    pub fn into_flat(self) -> FlatDocument {
        self.flat
    }
}

/// Join a block's `target_root` and a relative target.
pub fn join(base: &str, rel: &str) -> String {
    if base.is_empty() {
        rel.to_string()
    } else {
        format!("{base}/{rel}")
    }
}

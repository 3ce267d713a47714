//! Render a [`FlatDocument`] as an MX `Document`.
//!
//! Paths are walked segment by segment below a single `Document` root. The
//! first child with a matching local name is reused, `[n]` occurrence
//! suffixes are dropped, and a final `@name` segment sets an attribute.
//! When a path carries several values the last one is written.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;

use mtx_model::FlatDocument;

use crate::error::{BuildError, Result};
use crate::namespaces::namespace_for;

const ROOT_ELEMENT: &str = "Document";

#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    fn child_mut(&mut self, name: &str) -> &mut Element {
        let index = match self.children.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                self.children.push(Element::named(name));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn insert(&mut self, path: &str, values: &[String]) {
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
        if segments.peek() == Some(&ROOT_ELEMENT) {
            segments.next();
        }

        let mut node = self;
        for segment in segments {
            if let Some(attribute) = segment.strip_prefix('@') {
                if let Some(last) = values.last() {
                    node.set_attribute(attribute, last);
                }
                return;
            }
            let name = segment.split_once('[').map_or(segment, |(name, _)| name);
            node = node.child_mut(name);
        }
        if let Some(last) = values.last() {
            node.text = Some(last.clone());
        }
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> std::io::Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (name, value) in &self.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }
        if self.children.is_empty() && self.text.is_none() {
            return writer.write_event(Event::Empty(start));
        }
        writer.write_event(Event::Start(start))?;
        if let Some(text) = &self.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))
    }
}

/// Build the MX XML for `mx_type` from flat path values.
pub fn build(mx_type: &str, flat: &FlatDocument) -> Result<String> {
    let namespace = namespace_for(mx_type).ok_or_else(|| BuildError::UnknownNamespace {
        mx_type: mx_type.to_string(),
    })?;

    let mut root = Element::named(ROOT_ELEMENT);
    root.set_attribute("xmlns", &namespace);
    for (path, values) in flat.iter() {
        root.insert(path, values);
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(|source| BuildError::Write { source })?;
    root.write(&mut writer)
        .map_err(|source| BuildError::Write { source })?;

    let xml = String::from_utf8(writer.into_inner()).map_err(|source| BuildError::Utf8 { source })?;
    debug!(mx_type, paths = flat.len(), bytes = xml.len(), "built MX document");
    Ok(xml)
}

//! A namespace-aware element tree with source line numbers.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};

use crate::error::XmlError;

pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// An expanded name. Displayed in Clark notation (`{ns}local`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub ns: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(ns: Option<&str>, local: &str) -> Self {
        Self {
            ns: ns.map(str::to_string),
            local: local.to_string(),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local),
            None => f.write_str(&self.local),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

type Scope = Rc<BTreeMap<String, String>>;

#[derive(Debug)]
pub struct Element {
    pub name: QName,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Element>,
    /// Character data directly inside this element, concatenated.
    pub text: String,
    pub line: usize,
    scope: Scope,
}

impl Element {
    pub fn is(&self, ns: &str, local: &str) -> bool {
        self.name.ns.as_deref() == Some(ns) && self.name.local == local
    }

    /// Value of an unqualified attribute.
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.ns.is_none() && a.name.local == local)
            .map(|a| a.value.as_str())
    }

    pub fn attribute_ns(&self, ns: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.ns.as_deref() == Some(ns) && a.name.local == local)
            .map(|a| a.value.as_str())
    }

    /// Resolve a `prefix:local` value against the namespaces in scope here.
    ///
    /// Unprefixed values take the default namespace.
    pub fn resolve_qname(&self, value: &str) -> Option<QName> {
        match split_prefix(value.trim()) {
            (Some(prefix), local) => self
                .scope
                .get(prefix)
                .map(|ns| QName::new(Some(ns), local)),
            (None, local) => Some(QName::new(self.scope.get("").map(String::as_str), local)),
        }
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

fn split_prefix(raw: &str) -> (Option<&str>, &str) {
    raw.split_once(':')
        .map_or((None, raw), |(prefix, local)| (Some(prefix), local))
}

/// Tracks the line number of a monotonically advancing byte offset.
struct LineCounter<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            offset: 0,
            line: 1,
        }
    }

    fn line_at(&mut self, offset: usize) -> usize {
        let end = offset.min(self.bytes.len());
        if end > self.offset {
            self.line += self.bytes[self.offset..end]
                .iter()
                .filter(|b| **b == b'\n')
                .count();
            self.offset = end;
        }
        self.line
    }
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

/// Parse a complete document into its root element.
pub fn parse(text: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(text);
    let mut lines = LineCounter::new(text);
    let base_scope: Scope = Rc::new(BTreeMap::from([("xml".to_string(), XML_NS.to_string())]));
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let line = lines.line_at(position(&reader));
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                let line = lines.line_at(position(&reader));
                return Err(XmlError::new(line, err.to_string()));
            }
        };
        match event {
            Event::Start(start) => {
                let scope = stack.last().map_or(&base_scope, |e| &e.scope).clone();
                if root.is_some() && stack.is_empty() {
                    return Err(XmlError::new(line, "extra content at the end of the document"));
                }
                stack.push(open(&start, scope, line)?);
            }
            Event::Empty(start) => {
                let scope = stack.last().map_or(&base_scope, |e| &e.scope).clone();
                let element = open(&start, scope, line)?;
                attach(&mut stack, &mut root, element, line)?;
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(XmlError::new(line, "unexpected end tag"));
                };
                attach(&mut stack, &mut root, element, line)?;
            }
            Event::Text(text) => {
                let decoded = text
                    .decode()
                    .map_err(|err| XmlError::new(line, err.to_string()))?;
                push_text(&mut stack, &decoded, line)?;
            }
            Event::CData(cdata) => {
                let decoded = cdata
                    .decode()
                    .map_err(|err| XmlError::new(line, err.to_string()))?;
                push_text(&mut stack, &decoded, line)?;
            }
            Event::GeneralRef(reference) => {
                let resolved = match reference.resolve_char_ref() {
                    Ok(Some(ch)) => ch.to_string(),
                    Ok(None) => {
                        let name = reference
                            .decode()
                            .map_err(|err| XmlError::new(line, err.to_string()))?;
                        resolve_predefined_entity(&name)
                            .ok_or_else(|| XmlError::new(line, format!("undefined entity '&{name};'")))?
                            .to_string()
                    }
                    Err(err) => return Err(XmlError::new(line, err.to_string())),
                };
                push_text(&mut stack, &resolved, line)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::new(
            lines.line_at(text.len()),
            format!("premature end of data, element '{}' is not closed", open.name.local),
        ));
    }
    root.ok_or_else(|| XmlError::new(1, "document is empty"))
}

/// The value of `attribute` on the root element, read without building a tree.
pub fn root_attribute(text: &str, attribute: &str) -> Option<String> {
    let mut reader = Reader::from_str(text);
    loop {
        match reader.read_event() {
            Ok(Event::Start(start) | Event::Empty(start)) => {
                return start
                    .try_get_attribute(attribute)
                    .ok()
                    .flatten()
                    .and_then(|attr| attr.unescape_value().ok())
                    .map(|value| value.into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

fn open(start: &BytesStart<'_>, parent: Scope, line: usize) -> Result<Element, XmlError> {
    let mut declared: Vec<(String, String)> = Vec::new();
    let mut raw: Vec<(String, String)> = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|err| XmlError::new(line, err.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|err| XmlError::new(line, err.to_string()))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|err| XmlError::new(line, err.to_string()))?
            .into_owned();
        if key == "xmlns" {
            declared.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declared.push((prefix.to_string(), value));
        } else {
            raw.push((key, value));
        }
    }

    let scope = if declared.is_empty() {
        parent
    } else {
        let mut map = (*parent).clone();
        for (prefix, uri) in declared {
            if uri.is_empty() {
                map.remove(&prefix);
            } else {
                map.insert(prefix, uri);
            }
        }
        Rc::new(map)
    };

    let raw_name = std::str::from_utf8(start.name().as_ref())
        .map_err(|err| XmlError::new(line, err.to_string()))?
        .to_string();
    let name = match split_prefix(&raw_name) {
        (Some(prefix), local) => {
            let ns = scope
                .get(prefix)
                .ok_or_else(|| XmlError::new(line, format!("namespace prefix {prefix} is not defined")))?;
            QName::new(Some(ns), local)
        }
        (None, local) => QName::new(scope.get("").map(String::as_str), local),
    };

    let mut attributes = Vec::with_capacity(raw.len());
    for (key, value) in raw {
        let name = match split_prefix(&key) {
            (Some(prefix), local) => {
                let ns = scope
                    .get(prefix)
                    .ok_or_else(|| XmlError::new(line, format!("namespace prefix {prefix} is not defined")))?;
                QName::new(Some(ns), local)
            }
            (None, local) => QName::new(None, local),
        };
        attributes.push(Attribute { name, value });
    }

    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
        line,
        scope,
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    line: usize,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(XmlError::new(line, "extra content at the end of the document"));
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str, line: usize) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.text.push_str(text),
        None if text.trim().is_empty() => {}
        None => return Err(XmlError::new(line, "text content outside the document element")),
    }
    Ok(())
}

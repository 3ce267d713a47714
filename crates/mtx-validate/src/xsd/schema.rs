//! Compiled schema components and the XSD compiler.
//!
//! The compiler covers the subset used by ISO 20022 message schemas: one
//! schema document with global elements and named or anonymous types,
//! `sequence`/`choice`/`all`/`any` particles, `simpleContent`, attributes,
//! and restriction facets. Anything else is rejected so the caller can fail
//! open instead of validating against a partial reading of the schema.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::error::SchemaError;
use crate::xsd::dom::{self, Element, QName};
use crate::xsd::types::{Builtin, Facets};

pub const XS_NS: &str = "http://www.w3.org/2001/XMLSchema";
pub const VC_NS: &str = "http://www.w3.org/2007/XMLSchema-versioning";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XsdVersion {
    V1_0,
    V1_1,
}

impl XsdVersion {
    fn number(self) -> (u32, u32) {
        match self {
            Self::V1_0 => (1, 0),
            Self::V1_1 => (1, 1),
        }
    }
}

impl fmt::Display for XsdVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor) = self.number();
        write!(f, "{major}.{minor}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef {
    AnyType,
    Builtin(Builtin),
    Simple(usize),
    Complex(usize),
}

#[derive(Debug)]
pub struct SimpleType {
    pub base: TypeRef,
    pub facets: Facets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeUse {
    Optional,
    Required,
    Prohibited,
}

#[derive(Debug, Clone)]
pub struct AttributeDecl {
    pub name: QName,
    pub ty: TypeRef,
    pub usage: AttributeUse,
    pub fixed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceConstraint {
    Any,
    Other,
    /// `None` stands for unqualified names.
    List(Vec<Option<String>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessContents {
    Strict,
    Lax,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wildcard {
    pub namespaces: NamespaceConstraint,
    pub process: ProcessContents,
}

impl Wildcard {
    pub fn matches(&self, ns: Option<&str>, target: Option<&str>) -> bool {
        match &self.namespaces {
            NamespaceConstraint::Any => true,
            NamespaceConstraint::Other => ns.is_some() && ns != target,
            NamespaceConstraint::List(allowed) => allowed.iter().any(|a| a.as_deref() == ns),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Term {
    Element(usize),
    Sequence(Vec<Particle>),
    Choice(Vec<Particle>),
    All(Vec<Particle>),
    Any(Wildcard),
}

#[derive(Debug, Clone)]
pub struct Particle {
    pub min: u32,
    /// `None` is unbounded.
    pub max: Option<u32>,
    pub term: Term,
}

#[derive(Debug, Clone)]
pub enum Content {
    Empty,
    Simple(TypeRef),
    Elements(Particle),
}

#[derive(Debug, Clone)]
pub struct ComplexType {
    pub content: Content,
    pub attributes: Vec<AttributeDecl>,
    pub any_attribute: bool,
    pub mixed: bool,
    pub open: Option<Wildcard>,
}

#[derive(Debug, Clone)]
pub struct ElementDecl {
    pub name: QName,
    pub ty: TypeRef,
}

/// A compiled schema, immutable and shareable across threads.
#[derive(Debug)]
pub struct Schema {
    version: XsdVersion,
    target_namespace: Option<String>,
    globals: HashMap<QName, usize>,
    elements: Vec<ElementDecl>,
    simple_types: Vec<SimpleType>,
    complex_types: Vec<ComplexType>,
    assertions: usize,
    alternatives: usize,
}

impl Schema {
    pub fn load(path: &Path, version: XsdVersion) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = Self::compile(&text, version)?;
        debug!(
            path = %path.display(),
            version = %version,
            elements = schema.elements.len(),
            types = schema.simple_types.len() + schema.complex_types.len(),
            "compiled schema"
        );
        Ok(schema)
    }

    pub fn compile(text: &str, version: XsdVersion) -> Result<Self, SchemaError> {
        let root = dom::parse(text)?;
        Compiler::new(&root, version)?.run()
    }

    pub fn version(&self) -> XsdVersion {
        self.version
    }

    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// `assert`/`assertion` components seen; recorded, not evaluated.
    pub fn assertion_count(&self) -> usize {
        self.assertions
    }

    /// Type `alternative`s seen; recorded, the declared type is used.
    pub fn alternative_count(&self) -> usize {
        self.alternatives
    }

    pub fn global(&self, name: &QName) -> Option<&ElementDecl> {
        self.globals.get(name).map(|id| &self.elements[*id])
    }

    pub fn element(&self, id: usize) -> &ElementDecl {
        &self.elements[id]
    }

    pub fn simple(&self, id: usize) -> &SimpleType {
        &self.simple_types[id]
    }

    pub fn complex(&self, id: usize) -> &ComplexType {
        &self.complex_types[id]
    }

    /// The built-in type at the bottom of a simple type's derivation chain.
    pub fn primitive(&self, ty: TypeRef) -> Builtin {
        let mut current = ty;
        loop {
            match current {
                TypeRef::Builtin(builtin) => return builtin,
                TypeRef::Simple(id) => current = self.simple(id).base,
                TypeRef::AnyType | TypeRef::Complex(_) => return Builtin::AnySimpleType,
            }
        }
    }
}

struct Compiler<'d> {
    version: XsdVersion,
    target_ns: Option<String>,
    elements_qualified: bool,
    attributes_qualified: bool,
    named_elements: HashMap<QName, &'d Element>,
    named_simple: HashMap<QName, &'d Element>,
    named_complex: HashMap<QName, &'d Element>,
    element_ids: HashMap<QName, usize>,
    simple_ids: HashMap<QName, usize>,
    complex_ids: HashMap<QName, usize>,
    elements: Vec<Option<ElementDecl>>,
    simple_types: Vec<Option<SimpleType>>,
    complex_types: Vec<Option<ComplexType>>,
    assertions: usize,
    alternatives: usize,
}

fn is_xs(el: &Element, local: &str) -> bool {
    el.is(XS_NS, local)
}

fn required_attr<'e>(el: &'e Element, name: &str) -> Result<&'e str, SchemaError> {
    el.attribute(name).ok_or_else(|| {
        SchemaError::invalid(
            el.line,
            format!("xs:{} requires the '{name}' attribute", el.name.local),
        )
    })
}

fn parse_version(el: &Element, value: &str) -> Result<(u32, u32), SchemaError> {
    let (major, minor) = value.trim().split_once('.').unwrap_or((value.trim(), "0"));
    match (major.parse(), minor.parse()) {
        (Ok(major), Ok(minor)) => Ok((major, minor)),
        _ => Err(SchemaError::invalid(
            el.line,
            format!("invalid schema version '{value}'"),
        )),
    }
}

fn occurs(el: &Element) -> Result<(u32, Option<u32>), SchemaError> {
    let bad = |attr: &str, value: &str| {
        SchemaError::invalid(el.line, format!("invalid {attr} value '{value}'"))
    };
    let min = match el.attribute("minOccurs") {
        Some(value) => value.trim().parse().map_err(|_| bad("minOccurs", value))?,
        None => 1,
    };
    let max = match el.attribute("maxOccurs").map(str::trim) {
        Some("unbounded") => None,
        Some(value) => Some(value.parse().map_err(|_| bad("maxOccurs", value))?),
        None => Some(1),
    };
    if max.is_some_and(|max| max < min) {
        return Err(SchemaError::invalid(el.line, "maxOccurs is less than minOccurs"));
    }
    Ok((min, max))
}

impl<'d> Compiler<'d> {
    fn new(root: &'d Element, version: XsdVersion) -> Result<Self, SchemaError> {
        if !is_xs(root, "schema") {
            return Err(SchemaError::invalid(
                root.line,
                format!("root element '{}' is not xs:schema", root.name),
            ));
        }
        let mut compiler = Self {
            version,
            target_ns: root.attribute("targetNamespace").map(str::to_string),
            elements_qualified: root.attribute("elementFormDefault") == Some("qualified"),
            attributes_qualified: root.attribute("attributeFormDefault") == Some("qualified"),
            named_elements: HashMap::new(),
            named_simple: HashMap::new(),
            named_complex: HashMap::new(),
            element_ids: HashMap::new(),
            simple_ids: HashMap::new(),
            complex_ids: HashMap::new(),
            elements: Vec::new(),
            simple_types: Vec::new(),
            complex_types: Vec::new(),
            assertions: 0,
            alternatives: 0,
        };

        for child in compiler.components(root)? {
            let local = child.name.local.as_str();
            match local {
                "element" | "simpleType" | "complexType" => {
                    let name = compiler.global_name(required_attr(child, "name")?);
                    let table = match local {
                        "element" => &mut compiler.named_elements,
                        "simpleType" => &mut compiler.named_simple,
                        _ => &mut compiler.named_complex,
                    };
                    if table.insert(name.clone(), child).is_some() {
                        return Err(SchemaError::invalid(
                            child.line,
                            format!("duplicate global {local} '{name}'"),
                        ));
                    }
                }
                "defaultOpenContent" => {
                    compiler.require_11(child, "xs:defaultOpenContent")?;
                    return Err(SchemaError::unsupported(child.line, "xs:defaultOpenContent"));
                }
                other => return Err(SchemaError::unsupported(child.line, format!("xs:{other}"))),
            }
        }
        Ok(compiler)
    }

    fn run(mut self) -> Result<Schema, SchemaError> {
        let mut names: Vec<(QName, usize)> = self
            .named_simple
            .iter()
            .map(|(name, el)| (name.clone(), el.line))
            .collect();
        names.sort();
        for (name, line) in names {
            self.named_simple_type(&name, line)?;
        }

        let mut names: Vec<(QName, usize)> = self
            .named_complex
            .iter()
            .map(|(name, el)| (name.clone(), el.line))
            .collect();
        names.sort();
        for (name, line) in names {
            self.named_complex_type(&name, line)?;
        }

        let mut names: Vec<(QName, usize)> = self
            .named_elements
            .iter()
            .map(|(name, el)| (name.clone(), el.line))
            .collect();
        names.sort();
        for (name, line) in names {
            self.global_element(&name, line)?;
        }

        let unresolved = || SchemaError::invalid(0, "schema component left unresolved");
        Ok(Schema {
            version: self.version,
            target_namespace: self.target_ns,
            globals: self.element_ids,
            elements: self.elements.into_iter().collect::<Option<_>>().ok_or_else(unresolved)?,
            simple_types: self
                .simple_types
                .into_iter()
                .collect::<Option<_>>()
                .ok_or_else(unresolved)?,
            complex_types: self
                .complex_types
                .into_iter()
                .collect::<Option<_>>()
                .ok_or_else(unresolved)?,
            assertions: self.assertions,
            alternatives: self.alternatives,
        })
    }

    fn global_name(&self, local: &str) -> QName {
        QName::new(self.target_ns.as_deref(), local)
    }

    fn require_11(&self, el: &Element, construct: &str) -> Result<(), SchemaError> {
        if self.version == XsdVersion::V1_0 {
            return Err(SchemaError::VersionMismatch {
                line: el.line,
                construct: construct.to_string(),
                version: self.version,
            });
        }
        Ok(())
    }

    /// Whether `vc:minVersion`/`vc:maxVersion` keep `el` in this version.
    fn included(&self, el: &Element) -> Result<bool, SchemaError> {
        let min = el.attribute_ns(VC_NS, "minVersion");
        let max = el.attribute_ns(VC_NS, "maxVersion");
        if self.version == XsdVersion::V1_0 {
            if let Some(min) = min
                && parse_version(el, min)? > XsdVersion::V1_0.number()
            {
                self.require_11(el, "vc:minVersion")?;
            }
            return Ok(true);
        }
        let ours = self.version.number();
        if let Some(min) = min
            && parse_version(el, min)? > ours
        {
            return Ok(false);
        }
        if let Some(max) = max
            && parse_version(el, max)? <= ours
        {
            return Ok(false);
        }
        Ok(true)
    }

    /// Schema-namespace children of `el` that apply to this version, minus annotations.
    fn components<'e>(&self, el: &'e Element) -> Result<Vec<&'e Element>, SchemaError> {
        let mut out = Vec::new();
        for child in &el.children {
            if child.name.ns.as_deref() != Some(XS_NS) || is_xs(child, "annotation") {
                continue;
            }
            if self.included(child)? {
                out.push(child);
            }
        }
        Ok(out)
    }

    fn type_ref(&mut self, el: &Element, value: &str) -> Result<TypeRef, SchemaError> {
        let name = el.resolve_qname(value).ok_or_else(|| {
            SchemaError::invalid(el.line, format!("undeclared namespace prefix in '{value}'"))
        })?;
        if name.ns.as_deref() == Some(XS_NS) {
            if name.local == "anyType" {
                return Ok(TypeRef::AnyType);
            }
            return Builtin::from_local(&name.local)
                .map(TypeRef::Builtin)
                .ok_or_else(|| SchemaError::unsupported(el.line, format!("xs:{}", name.local)));
        }
        if self.named_simple.contains_key(&name) {
            return self.named_simple_type(&name, el.line).map(TypeRef::Simple);
        }
        if self.named_complex.contains_key(&name) {
            return self.named_complex_type(&name, el.line).map(TypeRef::Complex);
        }
        Err(SchemaError::invalid(
            el.line,
            format!("unresolved type reference '{name}'"),
        ))
    }

    fn simple_type_ref(&mut self, el: &Element, value: &str) -> Result<TypeRef, SchemaError> {
        match self.type_ref(el, value)? {
            ty @ (TypeRef::Builtin(_) | TypeRef::Simple(_)) => Ok(ty),
            _ => Err(SchemaError::invalid(
                el.line,
                format!("'{value}' is not a simple type"),
            )),
        }
    }

    fn named_simple_type(&mut self, name: &QName, line: usize) -> Result<usize, SchemaError> {
        if let Some(id) = self.simple_ids.get(name) {
            if self.simple_types[*id].is_none() {
                return Err(SchemaError::invalid(
                    line,
                    format!("circular simple type definition '{name}'"),
                ));
            }
            return Ok(*id);
        }
        let el = *self
            .named_simple
            .get(name)
            .ok_or_else(|| SchemaError::invalid(line, format!("unresolved type reference '{name}'")))?;
        let id = self.simple_types.len();
        self.simple_types.push(None);
        self.simple_ids.insert(name.clone(), id);
        let simple = self.simple_type_body(el)?;
        self.simple_types[id] = Some(simple);
        Ok(id)
    }

    fn named_complex_type(&mut self, name: &QName, line: usize) -> Result<usize, SchemaError> {
        if let Some(id) = self.complex_ids.get(name) {
            return Ok(*id);
        }
        let el = *self
            .named_complex
            .get(name)
            .ok_or_else(|| SchemaError::invalid(line, format!("unresolved type reference '{name}'")))?;
        let id = self.complex_types.len();
        self.complex_types.push(None);
        self.complex_ids.insert(name.clone(), id);
        let complex = self.complex_type_body(el)?;
        self.complex_types[id] = Some(complex);
        Ok(id)
    }

    fn anonymous_simple(&mut self, el: &Element) -> Result<usize, SchemaError> {
        let simple = self.simple_type_body(el)?;
        self.simple_types.push(Some(simple));
        Ok(self.simple_types.len() - 1)
    }

    fn anonymous_complex(&mut self, el: &Element) -> Result<usize, SchemaError> {
        let id = self.complex_types.len();
        self.complex_types.push(None);
        let complex = self.complex_type_body(el)?;
        self.complex_types[id] = Some(complex);
        Ok(id)
    }

    fn global_element(&mut self, name: &QName, line: usize) -> Result<usize, SchemaError> {
        if let Some(id) = self.element_ids.get(name) {
            return Ok(*id);
        }
        let el = *self.named_elements.get(name).ok_or_else(|| {
            SchemaError::invalid(line, format!("unresolved element reference '{name}'"))
        })?;
        let id = self.elements.len();
        self.elements.push(None);
        self.element_ids.insert(name.clone(), id);
        let decl = self.element_decl(el, name.clone())?;
        self.elements[id] = Some(decl);
        Ok(id)
    }

    fn element_decl(&mut self, el: &Element, name: QName) -> Result<ElementDecl, SchemaError> {
        for unsupported in ["substitutionGroup", "abstract"] {
            if el.attribute(unsupported).is_some() {
                return Err(SchemaError::unsupported(el.line, format!("element/@{unsupported}")));
            }
        }
        let mut ty = match el.attribute("type") {
            Some(value) => Some(self.type_ref(el, value)?),
            None => None,
        };
        for child in self.components(el)? {
            let local = child.name.local.as_str();
            match local {
                "complexType" | "simpleType" => {
                    if ty.is_some() {
                        return Err(SchemaError::invalid(
                            child.line,
                            format!("element '{name}' declares more than one type"),
                        ));
                    }
                    ty = Some(if local == "complexType" {
                        TypeRef::Complex(self.anonymous_complex(child)?)
                    } else {
                        TypeRef::Simple(self.anonymous_simple(child)?)
                    });
                }
                "alternative" => {
                    self.require_11(child, "xs:alternative")?;
                    self.alternatives += 1;
                }
                "key" | "keyref" | "unique" => {}
                other => return Err(SchemaError::unsupported(child.line, format!("xs:{other}"))),
            }
        }
        Ok(ElementDecl {
            name,
            ty: ty.unwrap_or(TypeRef::AnyType),
        })
    }

    fn simple_type_body(&mut self, el: &Element) -> Result<SimpleType, SchemaError> {
        let mut restriction = None;
        for child in self.components(el)? {
            match child.name.local.as_str() {
                "restriction" => restriction = Some(child),
                other => return Err(SchemaError::unsupported(child.line, format!("xs:{other}"))),
            }
        }
        let restriction = restriction
            .ok_or_else(|| SchemaError::invalid(el.line, "simple type without a restriction"))?;
        let base = match restriction.attribute("base") {
            Some(value) => Some(self.simple_type_ref(restriction, value)?),
            None => None,
        };
        let parts = self.restriction_parts(restriction, false)?;
        let base = parts.inline_base.or(base).ok_or_else(|| {
            SchemaError::invalid(restriction.line, "restriction without a base type")
        })?;
        Ok(SimpleType {
            base,
            facets: parts.facets,
        })
    }

    fn restriction_parts(
        &mut self,
        el: &Element,
        allow_attributes: bool,
    ) -> Result<RestrictionParts, SchemaError> {
        let mut parts = RestrictionParts::default();
        for child in self.components(el)? {
            let facets = &mut parts.facets;
            match child.name.local.as_str() {
                "simpleType" => parts.inline_base = Some(TypeRef::Simple(self.anonymous_simple(child)?)),
                "enumeration" => facets.enumeration.push(required_attr(child, "value")?.to_string()),
                "pattern" => {
                    let pattern = required_attr(child, "value")?;
                    let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|err| {
                        SchemaError::invalid(child.line, format!("invalid pattern '{pattern}': {err}"))
                    })?;
                    facets.patterns.push((pattern.to_string(), regex));
                }
                "length" => facets.length = Some(facet_number(child)?),
                "minLength" => facets.min_length = Some(facet_number(child)?),
                "maxLength" => facets.max_length = Some(facet_number(child)?),
                "totalDigits" => facets.total_digits = Some(facet_number(child)?),
                "fractionDigits" => facets.fraction_digits = Some(facet_number(child)?),
                "minInclusive" => facets.min_inclusive = Some(required_attr(child, "value")?.trim().to_string()),
                "maxInclusive" => facets.max_inclusive = Some(required_attr(child, "value")?.trim().to_string()),
                "minExclusive" => facets.min_exclusive = Some(required_attr(child, "value")?.trim().to_string()),
                "maxExclusive" => facets.max_exclusive = Some(required_attr(child, "value")?.trim().to_string()),
                "whiteSpace" => {}
                "assertion" => {
                    self.require_11(child, "xs:assertion")?;
                    self.assertions += 1;
                }
                "explicitTimezone" => self.require_11(child, "xs:explicitTimezone")?,
                "attribute" if allow_attributes => parts.attributes.push(self.attribute_decl(child)?),
                "anyAttribute" if allow_attributes => parts.any_attribute = true,
                "assert" if allow_attributes => {
                    self.require_11(child, "xs:assert")?;
                    self.assertions += 1;
                }
                other => return Err(SchemaError::unsupported(child.line, format!("xs:{other}"))),
            }
        }
        Ok(parts)
    }

    fn complex_type_body(&mut self, el: &Element) -> Result<ComplexType, SchemaError> {
        let mut complex = ComplexType {
            content: Content::Empty,
            attributes: Vec::new(),
            any_attribute: false,
            mixed: el.attribute("mixed") == Some("true"),
            open: None,
        };
        for child in self.components(el)? {
            match child.name.local.as_str() {
                "sequence" | "choice" | "all" => {
                    complex.content = Content::Elements(self.particle(child)?);
                }
                "simpleContent" => self.simple_content(child, &mut complex)?,
                "attribute" => complex.attributes.push(self.attribute_decl(child)?),
                "anyAttribute" => complex.any_attribute = true,
                "openContent" => {
                    self.require_11(child, "xs:openContent")?;
                    complex.open = self.open_content(child)?;
                }
                "assert" => {
                    self.require_11(child, "xs:assert")?;
                    self.assertions += 1;
                }
                other => return Err(SchemaError::unsupported(child.line, format!("xs:{other}"))),
            }
        }
        Ok(complex)
    }

    fn simple_content(&mut self, el: &Element, complex: &mut ComplexType) -> Result<(), SchemaError> {
        let derivation = self
            .components(el)?
            .into_iter()
            .next()
            .ok_or_else(|| SchemaError::invalid(el.line, "empty xs:simpleContent"))?;
        let base_name = required_attr(derivation, "base")?;
        let base = self.type_ref(derivation, base_name)?;

        let (inherited, base_content) = match base {
            TypeRef::Builtin(_) | TypeRef::Simple(_) => (Vec::new(), base),
            TypeRef::Complex(id) => {
                let base_type = self.complex_types[id].as_ref().ok_or_else(|| {
                    SchemaError::invalid(derivation.line, format!("circular type derivation from '{base_name}'"))
                })?;
                let Content::Simple(content) = base_type.content else {
                    return Err(SchemaError::invalid(
                        derivation.line,
                        format!("'{base_name}' does not have simple content"),
                    ));
                };
                complex.any_attribute |= base_type.any_attribute;
                (base_type.attributes.clone(), content)
            }
            TypeRef::AnyType => {
                return Err(SchemaError::invalid(
                    derivation.line,
                    "simple content cannot derive from xs:anyType",
                ));
            }
        };
        complex.attributes = inherited;

        match derivation.name.local.as_str() {
            "extension" => {
                complex.content = Content::Simple(base_content);
                for child in self.components(derivation)? {
                    match child.name.local.as_str() {
                        "attribute" => override_attribute(&mut complex.attributes, self.attribute_decl(child)?),
                        "anyAttribute" => complex.any_attribute = true,
                        "assert" => {
                            self.require_11(child, "xs:assert")?;
                            self.assertions += 1;
                        }
                        other => {
                            return Err(SchemaError::unsupported(child.line, format!("xs:{other}")));
                        }
                    }
                }
            }
            "restriction" => {
                let parts = self.restriction_parts(derivation, true)?;
                let restricted = SimpleType {
                    base: parts.inline_base.unwrap_or(base_content),
                    facets: parts.facets,
                };
                self.simple_types.push(Some(restricted));
                complex.content = Content::Simple(TypeRef::Simple(self.simple_types.len() - 1));
                for attribute in parts.attributes {
                    override_attribute(&mut complex.attributes, attribute);
                }
                complex.any_attribute |= parts.any_attribute;
            }
            other => return Err(SchemaError::unsupported(derivation.line, format!("xs:{other}"))),
        }
        Ok(())
    }

    fn attribute_decl(&mut self, el: &Element) -> Result<AttributeDecl, SchemaError> {
        if el.attribute("ref").is_some() {
            return Err(SchemaError::unsupported(el.line, "attribute/@ref"));
        }
        let local = required_attr(el, "name")?;
        let qualified = match el.attribute("form") {
            Some(form) => form == "qualified",
            None => self.attributes_qualified,
        };
        let name = QName::new(qualified.then_some(self.target_ns.as_deref()).flatten(), local);

        let mut ty = match el.attribute("type") {
            Some(value) => Some(self.simple_type_ref(el, value)?),
            None => None,
        };
        for child in self.components(el)? {
            match child.name.local.as_str() {
                "simpleType" => ty = Some(TypeRef::Simple(self.anonymous_simple(child)?)),
                other => return Err(SchemaError::unsupported(child.line, format!("xs:{other}"))),
            }
        }
        let usage = match el.attribute("use") {
            None | Some("optional") => AttributeUse::Optional,
            Some("required") => AttributeUse::Required,
            Some("prohibited") => AttributeUse::Prohibited,
            Some(other) => {
                return Err(SchemaError::invalid(el.line, format!("invalid attribute use '{other}'")));
            }
        };
        Ok(AttributeDecl {
            name,
            ty: ty.unwrap_or(TypeRef::Builtin(Builtin::AnySimpleType)),
            usage,
            fixed: el.attribute("fixed").map(str::to_string),
        })
    }

    fn particle(&mut self, el: &Element) -> Result<Particle, SchemaError> {
        let (min, max) = occurs(el)?;
        let term = match el.name.local.as_str() {
            "element" => self.element_term(el)?,
            "any" => Term::Any(self.wildcard(el)?),
            "sequence" | "choice" => {
                let mut items = Vec::new();
                for child in self.components(el)? {
                    match child.name.local.as_str() {
                        "element" | "sequence" | "choice" | "any" => items.push(self.particle(child)?),
                        other => {
                            return Err(SchemaError::unsupported(child.line, format!("xs:{other}")));
                        }
                    }
                }
                if el.name.local == "sequence" {
                    Term::Sequence(items)
                } else {
                    Term::Choice(items)
                }
            }
            "all" => {
                let mut items = Vec::new();
                for child in self.components(el)? {
                    let item = match child.name.local.as_str() {
                        "element" => self.particle(child)?,
                        "any" => {
                            self.require_11(child, "xs:any inside xs:all")?;
                            self.particle(child)?
                        }
                        other => {
                            return Err(SchemaError::unsupported(child.line, format!("xs:{other}")));
                        }
                    };
                    if item.max != Some(1) && item.max != Some(0) {
                        self.require_11(child, "maxOccurs > 1 inside xs:all")?;
                    }
                    items.push(item);
                }
                Term::All(items)
            }
            other => return Err(SchemaError::unsupported(el.line, format!("xs:{other}"))),
        };
        Ok(Particle { min, max, term })
    }

    fn element_term(&mut self, el: &Element) -> Result<Term, SchemaError> {
        if let Some(reference) = el.attribute("ref") {
            let name = el.resolve_qname(reference).ok_or_else(|| {
                SchemaError::invalid(el.line, format!("undeclared namespace prefix in '{reference}'"))
            })?;
            return self.global_element(&name, el.line).map(Term::Element);
        }
        let local = required_attr(el, "name")?;
        let qualified = match el.attribute("form") {
            Some(form) => form == "qualified",
            None => self.elements_qualified,
        };
        let name = QName::new(qualified.then_some(self.target_ns.as_deref()).flatten(), local);
        let decl = self.element_decl(el, name)?;
        self.elements.push(Some(decl));
        Ok(Term::Element(self.elements.len() - 1))
    }

    fn wildcard(&self, el: &Element) -> Result<Wildcard, SchemaError> {
        let namespaces = match el.attribute("namespace").map(str::trim) {
            None | Some("##any") => NamespaceConstraint::Any,
            Some("##other") => NamespaceConstraint::Other,
            Some(list) => NamespaceConstraint::List(
                list.split_whitespace()
                    .map(|token| match token {
                        "##targetNamespace" => self.target_ns.clone(),
                        "##local" => None,
                        uri => Some(uri.to_string()),
                    })
                    .collect(),
            ),
        };
        let process = match el.attribute("processContents") {
            None | Some("strict") => ProcessContents::Strict,
            Some("lax") => ProcessContents::Lax,
            Some("skip") => ProcessContents::Skip,
            Some(other) => {
                return Err(SchemaError::invalid(
                    el.line,
                    format!("invalid processContents '{other}'"),
                ));
            }
        };
        Ok(Wildcard { namespaces, process })
    }

    fn open_content(&self, el: &Element) -> Result<Option<Wildcard>, SchemaError> {
        if el.attribute("mode") == Some("none") {
            return Ok(None);
        }
        match self.components(el)?.first() {
            Some(child) if is_xs(child, "any") => self.wildcard(child).map(Some),
            Some(child) => Err(SchemaError::unsupported(child.line, format!("xs:{}", child.name.local))),
            None => Ok(None),
        }
    }
}

#[derive(Default)]
struct RestrictionParts {
    inline_base: Option<TypeRef>,
    facets: Facets,
    attributes: Vec<AttributeDecl>,
    any_attribute: bool,
}

fn facet_number(el: &Element) -> Result<usize, SchemaError> {
    let value = required_attr(el, "value")?;
    value.trim().parse().map_err(|_| {
        SchemaError::invalid(
            el.line,
            format!("invalid {} value '{value}'", el.name.local),
        )
    })
}

fn override_attribute(attributes: &mut Vec<AttributeDecl>, attribute: AttributeDecl) {
    match attributes.iter_mut().find(|a| a.name == attribute.name) {
        Some(existing) => *existing = attribute,
        None => attributes.push(attribute),
    }
}

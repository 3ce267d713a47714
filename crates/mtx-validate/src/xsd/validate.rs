//! Instance validation against a compiled [`Schema`].
//!
//! Errors read like libxml2's: `line N: Element 'name': message`.

use std::collections::HashSet;

use crate::xsd::dom::{self, Element, QName, XSI_NS};
use crate::xsd::schema::{
    AttributeUse, ComplexType, Content, Particle, ProcessContents, Schema, Term, TypeRef, Wildcard,
};
use crate::xsd::types::Facets;

/// Validate `xml` and return every error found, in document order.
pub fn validate(schema: &Schema, xml: &str) -> Vec<String> {
    let root = match dom::parse(xml) {
        Ok(root) => root,
        Err(err) => return vec![err.to_string()],
    };
    let mut validator = Validator {
        schema,
        errors: Vec::new(),
    };
    match schema.global(&root.name) {
        Some(decl) => validator.element(decl.ty, &root),
        None => validator.report(
            &root,
            "No matching global declaration available for the validation root.",
        ),
    }
    validator.errors
}

struct Validator<'s> {
    schema: &'s Schema,
    errors: Vec<String>,
}

impl Validator<'_> {
    fn report(&mut self, el: &Element, message: impl AsRef<str>) {
        self.errors.push(format!(
            "line {}: Element '{}': {}",
            el.line,
            el.name,
            message.as_ref()
        ));
    }

    fn report_attribute(&mut self, el: &Element, attribute: &QName, message: impl AsRef<str>) {
        self.errors.push(format!(
            "line {}: Element '{}', attribute '{}': {}",
            el.line,
            el.name,
            attribute,
            message.as_ref()
        ));
    }

    fn element(&mut self, ty: TypeRef, el: &Element) {
        match ty {
            TypeRef::AnyType => {}
            TypeRef::Builtin(_) | TypeRef::Simple(_) => {
                for attribute in el.attributes.iter().filter(|a| a.name.ns.as_deref() != Some(XSI_NS)) {
                    self.report_attribute(el, &attribute.name, format!("The attribute '{}' is not allowed.", attribute.name));
                }
                if !el.children.is_empty() {
                    self.report(el, "Element content is not allowed, because the type definition is simple.");
                    return;
                }
                if let Err(message) = self.simple_value(ty, &el.text) {
                    self.report(el, message);
                }
            }
            TypeRef::Complex(id) => {
                let complex = self.schema.complex(id);
                self.attributes(complex, el);
                self.content(complex, el);
            }
        }
    }

    /// Check a value against a simple type, base restrictions first.
    fn simple_value(&self, ty: TypeRef, raw: &str) -> Result<(), String> {
        let builtin = self.schema.primitive(ty);
        let value = builtin.normalize(raw);
        builtin.check(&value)?;

        let mut steps: Vec<&Facets> = Vec::new();
        let mut current = ty;
        while let TypeRef::Simple(id) = current {
            let simple = self.schema.simple(id);
            steps.push(&simple.facets);
            current = simple.base;
        }
        for facets in steps.into_iter().rev() {
            facets.check(&value, builtin)?;
        }
        Ok(())
    }

    fn attributes(&mut self, complex: &ComplexType, el: &Element) {
        for attribute in &el.attributes {
            if attribute.name.ns.as_deref() == Some(XSI_NS) {
                continue;
            }
            let decl = complex
                .attributes
                .iter()
                .find(|decl| decl.name == attribute.name && decl.usage != AttributeUse::Prohibited);
            let Some(decl) = decl else {
                if !complex.any_attribute {
                    self.report_attribute(el, &attribute.name, format!("The attribute '{}' is not allowed.", attribute.name));
                }
                continue;
            };
            if let Err(message) = self.simple_value(decl.ty, &attribute.value) {
                self.report_attribute(el, &attribute.name, message);
                continue;
            }
            if let Some(fixed) = &decl.fixed {
                let builtin = self.schema.primitive(decl.ty);
                if builtin.normalize(&attribute.value) != builtin.normalize(fixed) {
                    self.report_attribute(
                        el,
                        &attribute.name,
                        format!(
                            "The value '{}' does not match the fixed value constraint '{fixed}'.",
                            attribute.value
                        ),
                    );
                }
            }
        }

        for decl in complex.attributes.iter().filter(|a| a.usage == AttributeUse::Required) {
            if !el.attributes.iter().any(|a| a.name == decl.name) {
                self.report(el, format!("The attribute '{}' is required but missing.", decl.name));
            }
        }
    }

    fn content(&mut self, complex: &ComplexType, el: &Element) {
        match &complex.content {
            Content::Empty => {
                if el.has_text() {
                    self.report(el, "Character content is not allowed, because the content type is empty.");
                }
                if !el.children.is_empty() {
                    self.report(el, "Element content is not allowed, because the content type is empty.");
                }
            }
            Content::Simple(ty) => {
                if !el.children.is_empty() {
                    self.report(el, "Element content is not allowed, because the content type is a simple type definition.");
                    return;
                }
                if let Err(message) = self.simple_value(*ty, &el.text) {
                    self.report(el, message);
                }
            }
            Content::Elements(particle) => {
                if !complex.mixed && el.has_text() {
                    self.report(
                        el,
                        "Character content other than whitespace is not allowed because the content type is 'element-only'.",
                    );
                }
                self.children(particle, complex.open.as_ref(), el);
            }
        }
    }

    fn children(&mut self, particle: &Particle, open: Option<&Wildcard>, el: &Element) {
        let mut interleaved = Vec::new();
        let mut modelled: Vec<&Element> = Vec::new();
        match open {
            Some(open) => {
                let mut declared = HashSet::new();
                declared_names(self.schema, particle, &mut declared);
                for child in &el.children {
                    let ns = child.name.ns.as_deref();
                    if !declared.contains(&child.name) && open.matches(ns, self.schema.target_namespace()) {
                        interleaved.push((child, open.process));
                    } else {
                        modelled.push(child);
                    }
                }
            }
            None => modelled.extend(el.children.iter()),
        }

        let mut matcher = Matcher {
            schema: self.schema,
            children: &modelled,
            pos: 0,
            bindings: Vec::new(),
            furthest: 0,
            expected: Vec::new(),
        };
        let matched = matcher.particle(particle);

        if matched && matcher.pos == modelled.len() {
            let bindings = std::mem::take(&mut matcher.bindings);
            for (index, binding) in bindings {
                let child = modelled[index];
                match binding {
                    Binding::Element(id) => self.element(self.schema.element(id).ty, child),
                    Binding::Wildcard(process) => self.wildcard_child(process, child),
                }
            }
            for (child, process) in interleaved {
                self.wildcard_child(process, child);
            }
            return;
        }

        let (at, expected) = if matched {
            let expected = if matcher.furthest == matcher.pos {
                matcher.expected
            } else {
                Vec::new()
            };
            (matcher.pos, expected)
        } else {
            (matcher.furthest, matcher.expected)
        };
        let expected = expected_clause(&expected);
        match modelled.get(at) {
            Some(child) => self.report(child, format!("This element is not expected.{expected}")),
            None => self.report(el, format!("Missing child element(s).{expected}")),
        }
    }

    fn wildcard_child(&mut self, process: ProcessContents, child: &Element) {
        let global = self.schema.global(&child.name).map(|decl| decl.ty);
        match (process, global) {
            (ProcessContents::Skip, _) | (ProcessContents::Lax, None) => {}
            (_, Some(ty)) => self.element(ty, child),
            (ProcessContents::Strict, None) => self.report(
                child,
                "No matching global element declaration available, but demanded by the strict wildcard.",
            ),
        }
    }
}

fn expected_clause(expected: &[String]) -> String {
    match expected {
        [] => String::new(),
        [one] => format!(" Expected is ( {one} )."),
        many => format!(" Expected is one of ( {} ).", many.join(", ")),
    }
}

fn declared_names<'s>(schema: &'s Schema, particle: &'s Particle, out: &mut HashSet<&'s QName>) {
    match &particle.term {
        Term::Element(id) => {
            out.insert(&schema.element(*id).name);
        }
        Term::Sequence(items) | Term::Choice(items) | Term::All(items) => {
            for item in items {
                declared_names(schema, item, out);
            }
        }
        Term::Any(_) => {}
    }
}

#[derive(Debug, Clone, Copy)]
enum Binding {
    Element(usize),
    Wildcard(ProcessContents),
}

/// Greedy content-model matcher.
///
/// Schemas obey unique particle attribution, so taking the first particle a
/// child fits is enough. Failed attempts are rolled back and the names
/// expected at the furthest child reached are kept for error messages.
struct Matcher<'s, 'x> {
    schema: &'s Schema,
    children: &'x [&'x Element],
    pos: usize,
    bindings: Vec<(usize, Binding)>,
    furthest: usize,
    expected: Vec<String>,
}

impl Matcher<'_, '_> {
    fn save(&self) -> (usize, usize) {
        (self.pos, self.bindings.len())
    }

    fn restore(&mut self, (pos, bindings): (usize, usize)) {
        self.pos = pos;
        self.bindings.truncate(bindings);
    }

    fn expect(&mut self, what: String) {
        if self.pos > self.furthest {
            self.furthest = self.pos;
            self.expected.clear();
        }
        if self.pos == self.furthest && !self.expected.contains(&what) {
            self.expected.push(what);
        }
    }

    fn current(&self) -> Option<&Element> {
        self.children.get(self.pos).copied()
    }

    /// Match `particle` between its min and max occurrences.
    fn particle(&mut self, particle: &Particle) -> bool {
        let mut count = 0u32;
        while particle.max.is_none_or(|max| count < max) {
            let saved = self.save();
            if !self.term(&particle.term) {
                self.restore(saved);
                break;
            }
            if self.pos == saved.0 {
                // An empty match satisfies every remaining occurrence.
                return true;
            }
            count += 1;
        }
        count >= particle.min
    }

    fn term(&mut self, term: &Term) -> bool {
        match term {
            Term::Element(id) => {
                let decl = self.schema.element(*id);
                if self.current().is_some_and(|child| child.name == decl.name) {
                    self.bindings.push((self.pos, Binding::Element(*id)));
                    self.pos += 1;
                    return true;
                }
                self.expect(decl.name.to_string());
                false
            }
            Term::Any(wildcard) => self.any(wildcard),
            Term::Sequence(items) => items.iter().all(|item| self.particle(item)),
            Term::Choice(items) => self.choice(items),
            Term::All(items) => self.all(items),
        }
    }

    fn any(&mut self, wildcard: &Wildcard) -> bool {
        let target = self.schema.target_namespace();
        if self
            .current()
            .is_some_and(|child| wildcard.matches(child.name.ns.as_deref(), target))
        {
            self.bindings.push((self.pos, Binding::Wildcard(wildcard.process)));
            self.pos += 1;
            return true;
        }
        self.expect("*".to_string());
        false
    }

    /// The first branch that consumes input wins; failing that, one that matches empty.
    fn choice(&mut self, items: &[Particle]) -> bool {
        let start = self.save();
        let mut empty_match = false;
        for item in items {
            if self.particle(item) {
                if self.pos > start.0 {
                    return true;
                }
                empty_match = true;
            }
            self.restore(start);
        }
        empty_match
    }

    fn all(&mut self, items: &[Particle]) -> bool {
        let mut counts = vec![0u32; items.len()];
        'children: while self.current().is_some() {
            for (item, count) in items.iter().zip(counts.iter_mut()) {
                if item.max.is_some_and(|max| *count >= max) {
                    continue;
                }
                let saved = self.save();
                if self.term(&item.term) && self.pos > saved.0 {
                    *count += 1;
                    continue 'children;
                }
                self.restore(saved);
            }
            break;
        }
        let mut complete = true;
        for (item, count) in items.iter().zip(&counts) {
            if *count < item.min {
                if let Term::Element(id) = item.term {
                    self.expect(self.schema.element(id).name.to_string());
                }
                complete = false;
            }
        }
        complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xsd::schema::XsdVersion;

    const SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns="urn:t" targetNamespace="urn:t" elementFormDefault="qualified">
  <xs:element name="Document" type="Doc"/>
  <xs:complexType name="Doc">
    <xs:sequence>
      <xs:element name="Id" type="Max5Text"/>
      <xs:choice>
        <xs:element name="BIC" type="xs:string"/>
        <xs:element name="Nm" type="xs:string"/>
      </xs:choice>
      <xs:element name="Amt" type="Amount" minOccurs="0" maxOccurs="2"/>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="Amount">
    <xs:simpleContent>
      <xs:extension base="xs:decimal">
        <xs:attribute name="Ccy" type="Currency" use="required"/>
      </xs:extension>
    </xs:simpleContent>
  </xs:complexType>
  <xs:simpleType name="Max5Text">
    <xs:restriction base="xs:string">
      <xs:minLength value="1"/>
      <xs:maxLength value="5"/>
    </xs:restriction>
  </xs:simpleType>
  <xs:simpleType name="Currency">
    <xs:restriction base="xs:string">
      <xs:pattern value="[A-Z]{3}"/>
    </xs:restriction>
  </xs:simpleType>
</xs:schema>"#;

    fn check(xml: &str) -> Vec<String> {
        let schema = Schema::compile(SCHEMA, XsdVersion::V1_0).unwrap();
        validate(&schema, xml)
    }

    #[test]
    fn accepts_a_valid_document() {
        let errors = check(
            r#"<Document xmlns="urn:t"><Id>A1</Id><Nm>Name</Nm><Amt Ccy="EUR">10.5</Amt><Amt Ccy="USD">1</Amt></Document>"#,
        );
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn reports_unexpected_and_missing_children() {
        let errors = check("<Document xmlns=\"urn:t\">\n<Nm>x</Nm>\n</Document>");
        assert_eq!(
            errors,
            ["line 2: Element '{urn:t}Nm': This element is not expected. Expected is ( {urn:t}Id )."]
        );

        let errors = check(r#"<Document xmlns="urn:t"><Id>A</Id></Document>"#);
        assert_eq!(
            errors,
            ["line 1: Element '{urn:t}Document': Missing child element(s). Expected is one of ( {urn:t}BIC, {urn:t}Nm )."]
        );

        let errors = check(
            r#"<Document xmlns="urn:t"><Id>A</Id><BIC>B</BIC><Amt Ccy="EUR">1</Amt><Amt Ccy="EUR">2</Amt><Amt Ccy="EUR">3</Amt></Document>"#,
        );
        assert_eq!(errors, ["line 1: Element '{urn:t}Amt': This element is not expected."]);
    }

    #[test]
    fn reports_value_and_attribute_errors() {
        let errors = check(
            r#"<Document xmlns="urn:t"><Id>TOOLONG</Id><BIC>B</BIC><Amt Ccy="eur">1</Amt><Amt>x</Amt></Document>"#,
        );
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors[0].contains("[facet 'maxLength']"), "{}", errors[0]);
        assert!(errors[1].starts_with("line 1: Element '{urn:t}Amt', attribute 'Ccy': [facet 'pattern']"));
        assert!(errors[2].ends_with("The attribute 'Ccy' is required but missing."));
        assert!(errors[3].contains("'x' is not a valid value of the atomic type 'xs:decimal'"));
    }

    #[test]
    fn wrong_root_and_malformed_input() {
        let errors = check("<Other/>");
        assert_eq!(
            errors,
            ["line 1: Element 'Other': No matching global declaration available for the validation root."]
        );
        let errors = check("<Document xmlns=\"urn:t\">\n<Id>");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("line "), "{}", errors[0]);
    }

    #[test]
    fn all_groups_accept_any_order() {
        let schema = Schema::compile(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="R"><xs:complexType><xs:all>
    <xs:element name="A" type="xs:string"/>
    <xs:element name="B" type="xs:string" minOccurs="0"/>
  </xs:all></xs:complexType></xs:element>
</xs:schema>"#,
            XsdVersion::V1_0,
        )
        .unwrap();
        assert!(validate(&schema, "<R><B/><A/></R>").is_empty());
        assert!(validate(&schema, "<R><A/></R>").is_empty());
        assert_eq!(
            validate(&schema, "<R><B/></R>"),
            ["line 1: Element 'R': Missing child element(s). Expected is ( A )."]
        );
    }
}

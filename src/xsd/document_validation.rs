//! Validation of documents against a compiled schema
//!
//! Walks the element tree from the root, checks each element against the
//! declaration its parent's content model assigns to it and collects every
//! violation with the location path of the offending element.

use std::sync::Arc;

use crate::documents::{Document, NodeId};
use crate::namespaces::{split_prefixed, XML_NAMESPACE, XSI_NAMESPACE};
use crate::validation::ConformanceIssue;

use super::components::{AttributeUse, ComplexType, Content, ElementDecl, ProcessContents, TypeRef};
use super::models::{describe_expected, ChildDecl, ChildName, ContentModel, ModelError};
use super::schemas::XsdSchema;

/// Validate `doc` against `schema`
pub fn validate_document(schema: &XsdSchema, doc: &Document) -> Vec<ConformanceIssue> {
    let mut validator = DocumentValidator {
        schema,
        doc,
        issues: Vec::new(),
    };
    let root = doc.root();
    let node = doc.node(root);
    match schema.global_element(node.namespace(), node.local_name()) {
        Some(decl) => validator.validate_element(root, &decl),
        None => validator.report(
            root,
            format!(
                "schema '{}' declares no global element <{}>{}",
                schema.source(),
                node.local_name(),
                node.namespace()
                    .map_or(String::new(), |ns| format!(" in namespace '{}'", ns))
            ),
        ),
    }
    validator.issues
}

/// Attribute with its resolved namespace
struct ResolvedAttribute<'d> {
    namespace: Option<&'d str>,
    local_name: &'d str,
    written: &'d str,
    value: &'d str,
}

struct DocumentValidator<'s, 'd> {
    schema: &'s XsdSchema,
    doc: &'d Document,
    issues: Vec<ConformanceIssue>,
}

impl<'s, 'd> DocumentValidator<'s, 'd> {
    fn report(&mut self, id: NodeId, message: impl Into<String>) {
        self.issues
            .push(ConformanceIssue::new(self.doc.path(id), message));
    }

    fn validate_element(&mut self, id: NodeId, decl: &ElementDecl) {
        let node = self.doc.node(id);
        let attributes = self.resolve_attributes(id);

        let nil = attributes
            .iter()
            .find(|a| a.namespace == Some(XSI_NAMESPACE) && a.local_name == "nil")
            .map(|a| matches!(a.value.trim(), "true" | "1"))
            .unwrap_or(false);
        if nil {
            if !decl.nillable {
                self.report(id, format!("element <{}> is not nillable", decl.name));
            } else if !node.children.is_empty() || has_character_content(self.doc, id) {
                self.report(id, format!("nil element <{}> must be empty", decl.name));
            }
        }

        match &decl.type_ref {
            TypeRef::Simple(simple) => {
                for attr in attributes.iter().filter(|a| !is_instance_attribute(a)) {
                    self.report(
                        id,
                        format!("unexpected attribute '{}' on <{}>", attr.written, decl.name),
                    );
                }
                if !node.children.is_empty() {
                    self.report(id, format!("element <{}> must not have child elements", decl.name));
                } else if !nil {
                    let text = node.text.as_deref().unwrap_or_default();
                    if let Err(e) = simple.validate(text) {
                        self.report(id, format!("<{}>: {}", decl.name, e));
                    }
                    self.check_fixed(id, decl, text);
                }
            }
            TypeRef::Named(qname) => match self.schema.complex_type(qname) {
                Some(complex) => {
                    let complex = complex.clone();
                    self.validate_complex(id, decl, &complex, &attributes, nil);
                }
                None => self.report(id, format!("type '{}' of <{}> is not defined", qname, decl.name)),
            },
            TypeRef::Complex(complex) => {
                self.validate_complex(id, decl, complex, &attributes, nil)
            }
            TypeRef::Any => self.validate_lax_children(id),
        }
    }

    fn validate_complex(
        &mut self,
        id: NodeId,
        decl: &ElementDecl,
        complex: &Arc<ComplexType>,
        attributes: &[ResolvedAttribute<'d>],
        nil: bool,
    ) {
        self.validate_attributes(id, decl, complex, attributes);
        if nil {
            return;
        }

        let node = self.doc.node(id);
        match &complex.content {
            Content::Empty => {
                if !node.children.is_empty() || has_character_content(self.doc, id) {
                    self.report(id, format!("element <{}> must be empty", decl.name));
                }
            }
            Content::Simple(simple) => {
                if !node.children.is_empty() {
                    self.report(id, format!("element <{}> must not have child elements", decl.name));
                    return;
                }
                let text = node.text.as_deref().unwrap_or_default();
                if let Err(e) = simple.validate(text) {
                    self.report(id, format!("<{}>: {}", decl.name, e));
                }
                self.check_fixed(id, decl, text);
            }
            Content::Elements { particle, mixed } => {
                if !mixed && has_character_content(self.doc, id) {
                    self.report(
                        id,
                        format!("text is not allowed in element-only content of <{}>", decl.name),
                    );
                }

                let children: Vec<NodeId> = node.children.clone();
                let names: Vec<ChildName<'_>> = children
                    .iter()
                    .map(|child| {
                        let child_node = self.doc.node(*child);
                        ChildName {
                            namespace: child_node.namespace(),
                            local_name: child_node.local_name(),
                        }
                    })
                    .collect();

                let model = ContentModel::new(self.schema, particle);
                let mut reported = None;
                match model.check(&names) {
                    Ok(()) => {}
                    Err(ModelError::Unexpected { index, expected }) => {
                        reported = Some(index);
                        let message = if expected.is_empty() {
                            format!(
                                "unexpected element <{}> in <{}>",
                                names[index].local_name, decl.name
                            )
                        } else {
                            format!(
                                "unexpected element <{}> in <{}>, expected {}",
                                names[index].local_name,
                                decl.name,
                                describe_expected(&expected)
                            )
                        };
                        self.report(children[index], message);
                    }
                    Err(ModelError::Incomplete { expected }) => self.report(
                        id,
                        format!(
                            "missing {} at the end of <{}>",
                            describe_expected(&expected),
                            decl.name
                        ),
                    ),
                }

                for (index, (child, name)) in children.iter().zip(&names).enumerate() {
                    match model.resolve(*name) {
                        Some(ChildDecl::Element(child_decl)) => {
                            self.validate_element(*child, &child_decl)
                        }
                        Some(ChildDecl::Wildcard(wildcard)) => match wildcard.process_contents {
                            ProcessContents::Skip => {}
                            ProcessContents::Lax => self.validate_if_declared(*child),
                            ProcessContents::Strict => {
                                match self.schema.global_element(name.namespace, name.local_name) {
                                    Some(global) => self.validate_element(*child, &global),
                                    None => self.report(
                                        *child,
                                        format!("no declaration for element <{}>", name.local_name),
                                    ),
                                }
                            }
                        },
                        None if reported == Some(index) => {}
                        None => self.report(
                            *child,
                            format!("unexpected element <{}> in <{}>", name.local_name, decl.name),
                        ),
                    }
                }
            }
        }
    }

    fn validate_attributes(
        &mut self,
        id: NodeId,
        decl: &ElementDecl,
        complex: &ComplexType,
        attributes: &[ResolvedAttribute<'d>],
    ) {
        for attr in attributes.iter().filter(|a| !is_instance_attribute(a)) {
            match complex.attribute(attr.namespace, attr.local_name) {
                Some(attr_decl) if attr_decl.usage == AttributeUse::Prohibited => self.report(
                    id,
                    format!("attribute '{}' is prohibited on <{}>", attr.written, decl.name),
                ),
                Some(attr_decl) => {
                    if let Err(e) = attr_decl.simple_type.validate(attr.value) {
                        self.report(id, e.with_field(attr.written).to_string());
                    }
                    if let Some(fixed) = &attr_decl.fixed {
                        if attr.value != fixed {
                            self.report(
                                id,
                                format!(
                                    "attribute '{}' on <{}> must have the fixed value '{}'",
                                    attr.written, decl.name, fixed
                                ),
                            );
                        }
                    }
                }
                None => {
                    let allowed = complex
                        .any_attribute
                        .as_ref()
                        .map_or(false, |w| w.allows(attr.namespace));
                    if !allowed {
                        self.report(
                            id,
                            format!("unexpected attribute '{}' on <{}>", attr.written, decl.name),
                        );
                    }
                }
            }
        }

        for required in complex
            .attributes
            .iter()
            .filter(|a| a.usage == AttributeUse::Required)
        {
            let present = attributes
                .iter()
                .any(|a| required.matches(a.namespace, a.local_name));
            if !present {
                self.report(
                    id,
                    format!("missing required attribute '{}' on <{}>", required.name, decl.name),
                );
            }
        }
    }

    fn check_fixed(&mut self, id: NodeId, decl: &ElementDecl, text: &str) {
        if let Some(fixed) = &decl.fixed {
            if !text.is_empty() && text != fixed {
                self.report(
                    id,
                    format!("element <{}> must have the fixed value '{}'", decl.name, fixed),
                );
            }
        }
    }

    fn validate_if_declared(&mut self, id: NodeId) {
        let node = self.doc.node(id);
        if let Some(decl) = self.schema.global_element(node.namespace(), node.local_name()) {
            self.validate_element(id, &decl);
        }
    }

    fn validate_lax_children(&mut self, id: NodeId) {
        let children = self.doc.children(id).to_vec();
        for child in children {
            self.validate_if_declared(child);
        }
    }

    fn resolve_attributes(&self, id: NodeId) -> Vec<ResolvedAttribute<'d>> {
        let doc = self.doc;
        doc.node(id)
            .attributes
            .iter()
            .map(|(written, value)| {
                let (prefix, local_name) = split_prefixed(written);
                let namespace = match prefix {
                    None => None,
                    Some("xml") => Some(XML_NAMESPACE),
                    Some(prefix) => doc.lookup_namespace(id, prefix),
                };
                ResolvedAttribute {
                    namespace,
                    local_name,
                    written,
                    value,
                }
            })
            .collect()
    }
}

/// `xsi:` attributes are instructions to the validator, never declared
fn is_instance_attribute(attr: &ResolvedAttribute<'_>) -> bool {
    attr.namespace == Some(XSI_NAMESPACE)
}

/// True if the element or the text between its children holds non-whitespace
fn has_character_content(doc: &Document, id: NodeId) -> bool {
    let node = doc.node(id);
    let blank = |text: &Option<String>| text.as_deref().map_or(true, |t| t.trim().is_empty());
    !blank(&node.text) || node.children.iter().any(|c| !blank(&doc.node(*c).tail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LAB_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
        xmlns="urn:lab" targetNamespace="urn:lab" elementFormDefault="qualified">
        <xs:import namespace="http://www.w3.org/XML/1998/namespace"/>
        <xs:element name="lab" type="TLab"/>
        <xs:complexType name="TLab">
            <xs:sequence>
                <xs:element name="sample" type="TSample" maxOccurs="unbounded"/>
                <xs:element name="note" type="TNote" minOccurs="0"/>
            </xs:sequence>
            <xs:attribute name="id" type="xs:positiveInteger" use="required"/>
            <xs:attribute name="legacy" type="xs:string" use="prohibited"/>
        </xs:complexType>
        <xs:complexType name="TSample">
            <xs:sequence>
                <xs:element name="mass" type="xs:double"/>
                <xs:element name="taken" type="xs:date" nillable="true" minOccurs="0"/>
                <xs:element name="sample" type="TSample" minOccurs="0"/>
            </xs:sequence>
            <xs:attribute name="grade">
                <xs:simpleType>
                    <xs:restriction base="xs:unsignedByte"><xs:maxInclusive value="5"/></xs:restriction>
                </xs:simpleType>
            </xs:attribute>
        </xs:complexType>
        <xs:complexType name="TNote">
            <xs:simpleContent>
                <xs:extension base="xs:string"><xs:attribute ref="xml:lang"/></xs:extension>
            </xs:simpleContent>
        </xs:complexType>
    </xs:schema>"#;

    fn issues(xml: &str) -> Vec<String> {
        let schema = XsdSchema::from_text(LAB_XSD, "lab.xsd").unwrap();
        let doc = Document::from_str(xml).unwrap();
        validate_document(&schema, &doc)
            .into_iter()
            .map(|i| i.to_string())
            .collect()
    }

    #[test]
    fn test_valid_document() {
        let found = issues(
            r#"<lab xmlns="urn:lab" id="3">
                <sample grade="2"><mass>1.5</mass><taken>2020-02-29</taken>
                    <sample><mass>0.5</mass></sample></sample>
                <sample><mass>2</mass></sample>
                <note xml:lang="en">dried</note>
            </lab>"#,
        );
        assert_eq!(found, Vec::<String>::new());
    }

    #[test]
    fn test_content_model_violations() {
        let found = issues(
            r#"<lab xmlns="urn:lab" id="3"><note>first</note><sample/></lab>"#,
        );
        assert_eq!(found.len(), 2, "{:?}", found);
        assert!(found[0].starts_with("/lab/note: unexpected element <note> in <lab>, expected <sample>"));
        assert_eq!(found[1], "/lab/sample: missing <mass> at the end of <sample>");
    }

    #[test]
    fn test_attribute_and_value_violations() {
        let found = issues(
            r#"<lab xmlns="urn:lab" legacy="yes" colour="red">
                <sample grade="9"><mass>heavy</mass><taken>2021-02-29</taken></sample>
            </lab>"#,
        );
        let joined = found.join("\n");
        assert!(joined.contains("attribute 'legacy' is prohibited"), "{}", joined);
        assert!(joined.contains("unexpected attribute 'colour'"), "{}", joined);
        assert!(joined.contains("missing required attribute 'id' on <lab>"), "{}", joined);
        assert!(joined.contains("maxInclusive"), "{}", joined);
        assert!(joined.contains("<mass>: invalid double"), "{}", joined);
        assert!(joined.contains("<taken>: invalid date"), "{}", joined);
        assert_eq!(found.len(), 6, "{}", joined);
    }

    #[test]
    fn test_nil_text_and_root() {
        let found = issues(
            r#"<lab xmlns="urn:lab" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" id="1">
                <sample><mass xsi:nil="true"/><taken xsi:nil="true"/></sample>stray</lab>"#,
        );
        assert_eq!(found.len(), 2, "{:?}", found);
        assert!(found[0].contains("text is not allowed"));
        assert!(found[1].contains("<mass> is not nillable"));

        let found = issues(r#"<bench xmlns="urn:lab"/>"#);
        assert_eq!(
            found,
            vec!["/bench: schema 'lab.xsd' declares no global element <bench> in namespace 'urn:lab'"]
        );
    }

    #[test]
    fn test_unqualified_children_are_rejected() {
        let found = issues(r#"<lab xmlns="urn:lab" id="1"><sample xmlns=""><mass>1</mass></sample></lab>"#);
        assert!(found[0].contains("unexpected element <sample>"), "{:?}", found);
    }
}

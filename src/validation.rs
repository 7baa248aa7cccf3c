//! Schema conformance checking
//!
//! Checks a document in two layers and collects every problem instead of
//! stopping at the first one. The XML Schema of the generation validates
//! structure and lexical values; the element type tables then add the
//! checks the schema cannot express, such as registry code check digits,
//! code tables and choice groups spread over attributes.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::coercion::{decode_as, normalize_inner_text};
use crate::documents::{Document, NodeId};
use crate::schema::{Cardinality, ElementType, Schema, Source};
use crate::xsd::XsdSchema;

/// One problem found while checking a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConformanceIssue {
    /// Location path of the offending element
    pub path: String,
    /// Description of the problem
    pub message: String,
}

impl ConformanceIssue {
    pub(crate) fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConformanceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Check `doc` against the XML Schema `xsd`, if given, and the element
/// type tables of `schema`
pub fn validate(doc: &Document, schema: &Schema, xsd: Option<&XsdSchema>) -> Vec<ConformanceIssue> {
    let mut issues = Vec::new();
    let root = doc.root();
    let root_node = doc.node(root);
    let path = doc.path(root);

    if root_node.local_name() != schema.root_tag || root_node.namespace() != Some(schema.namespace) {
        issues.push(ConformanceIssue::new(
            path,
            format!(
                "expected root <{}> in namespace '{}', found <{}> in {}",
                schema.root_tag,
                schema.namespace,
                root_node.local_name(),
                root_node
                    .namespace()
                    .map_or("no namespace".to_string(), |ns| format!("namespace '{}'", ns))
            ),
        ));
        return issues;
    }

    if let Some(xsd) = xsd {
        if xsd.target_namespace() == Some(schema.namespace) {
            issues.extend(xsd.validate(doc));
        } else {
            issues.push(ConformanceIssue::new(
                path.clone(),
                format!(
                    "schema '{}' targets namespace '{}', not '{}'",
                    xsd.source(),
                    xsd.target_namespace().unwrap_or(""),
                    schema.namespace
                ),
            ));
        }
    }

    match schema.root() {
        Ok(root_type) => check_element(doc, root, root_type, schema, &mut issues),
        Err(e) => issues.push(ConformanceIssue::new(path, e.to_string())),
    }
    issues
}

fn is_reserved_attribute(name: &str) -> bool {
    name.starts_with("xmlns") || name.starts_with("xsi:") || name.starts_with("xml:")
}

fn check_element(
    doc: &Document,
    node: NodeId,
    ty: &ElementType,
    schema: &Schema,
    issues: &mut Vec<ConformanceIssue>,
) {
    let path = doc.path(node);
    let element = doc.node(node);

    for (name, raw) in &element.attributes {
        if is_reserved_attribute(name) {
            continue;
        }
        match ty.attribute_field(name) {
            Some(field) => {
                if let Some(semantic) = field.semantic_type() {
                    if let Err(e) = decode_as(raw, semantic) {
                        issues.push(ConformanceIssue::new(
                            path.clone(),
                            e.with_field(field.name).to_string(),
                        ));
                    }
                }
            }
            None => issues.push(ConformanceIssue::new(
                path.clone(),
                format!("unexpected attribute '{}' on <{}>", name, element.local_name()),
            )),
        }
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut last_position = 0;
    for child in doc.children(node) {
        let child_node = doc.node(*child);
        let tag = child_node.local_name();
        let field = ty
            .child_field(tag)
            .filter(|_| child_node.namespace() == element.namespace());

        let Some(field) = field else {
            issues.push(ConformanceIssue::new(
                doc.path(*child),
                format!("unexpected element <{}> in <{}>", tag, element.local_name()),
            ));
            continue;
        };

        let count = counts.entry(field.name).or_insert(0);
        *count += 1;
        if *count == 2 && !field.is_repeated() {
            issues.push(ConformanceIssue::new(
                doc.path(*child),
                format!("element <{}> may occur at most once", tag),
            ));
        }

        if let Some(position) = ty.position(field.name) {
            if position < last_position {
                issues.push(ConformanceIssue::new(
                    doc.path(*child),
                    format!("element <{}> is out of schema order", tag),
                ));
            } else {
                last_position = position;
            }
        }

        match field.source {
            Source::Text(semantic) => {
                let raw = doc.text(*child).unwrap_or_default();
                let text = if field.is_repeated() {
                    normalize_inner_text(raw)
                } else {
                    raw.to_string()
                };
                if let Err(e) = decode_as(&text, &semantic) {
                    issues.push(ConformanceIssue::new(
                        doc.path(*child),
                        e.with_field(field.name).to_string(),
                    ));
                }
            }
            Source::Element(type_name) => match schema.resolve(type_name) {
                Ok(child_ty) => check_element(doc, *child, child_ty, schema, issues),
                Err(e) => issues.push(ConformanceIssue::new(doc.path(*child), e.to_string())),
            },
            Source::Attribute(_) => {}
        }
    }

    for field in ty.fields.iter().filter(|f| f.cardinality == Cardinality::Required) {
        let present = match field.source {
            Source::Attribute(_) => element.attributes.contains_key(field.name),
            _ => counts.contains_key(field.name),
        };
        if !present {
            let what = if field.is_attribute() {
                format!("attribute '{}'", field.name)
            } else {
                format!("element <{}>", field.name)
            };
            issues.push(ConformanceIssue::new(
                path.clone(),
                format!("missing required {} in <{}>", what, element.local_name()),
            ));
        }
    }

    for group in ty.choices {
        let present: Vec<&str> = group
            .members
            .iter()
            .copied()
            .filter(|m| counts.contains_key(m) || element.attributes.contains_key(*m))
            .collect();
        if present.len() > 1 {
            issues.push(ConformanceIssue::new(
                path.clone(),
                format!(
                    "choice '{}' allows one of {}, found {}",
                    group.id,
                    group.members.join(", "),
                    present.join(" and ")
                ),
            ));
        }
    }
}

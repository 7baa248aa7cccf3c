//! Attribute binder
//!
//! Generic accessors that read and write one field of one element, driven
//! entirely by the field's [`FieldDescriptor`]. Attribute fields live on the
//! element itself, text fields in simple-content children named after the
//! field, and element fields in nested complex children.
//!
//! Writes keep children in schema order: a new child is inserted before the
//! first sibling whose field is declared later. Writing a member of a choice
//! group first removes every other member of that group.

use tracing::trace;

use crate::coercion::{decode, encode, normalize_inner_text, Value};
use crate::defaults::DefaultRegistry;
use crate::documents::{Document, NodeId};
use crate::error::{Error, Result};
use crate::schema::{Cardinality, ElementType, FieldDescriptor, Source};

fn kind_error(ty: &ElementType, field: &FieldDescriptor, expected: &'static str) -> Error {
    Error::FieldKind {
        element_type: ty.name.to_string(),
        field: field.name.to_string(),
        expected,
        actual: field.kind(),
    }
}

// =============================================================================
// Scalars
// =============================================================================

/// Raw text stored for a single-valued scalar field
pub fn raw_value<'d>(doc: &'d Document, node: NodeId, field: &FieldDescriptor) -> Option<&'d str> {
    match field.source {
        Source::Attribute(_) => doc.attribute(node, field.name),
        Source::Text(_) => doc
            .find_child(node, field.name)
            .and_then(|child| doc.text(child)),
        Source::Element(_) => None,
    }
}

/// True if the field has a non-empty value (or, for element fields, a child)
pub fn is_present(doc: &Document, node: NodeId, field: &FieldDescriptor) -> bool {
    match field.source {
        Source::Element(_) => doc.find_child(node, field.name).is_some(),
        _ => raw_value(doc, node, field).map_or(false, |raw| !raw.trim().is_empty()),
    }
}

/// Read a single-valued scalar field
///
/// An absent (or empty) value falls through to the registry default, then to
/// the schema default. A required field with neither fails with
/// [`Error::MissingField`]; an optional one reads as `None`. An absent choice
/// member reads as `None` while another member of its group is present.
pub fn read(
    doc: &Document,
    node: NodeId,
    ty: &ElementType,
    field: &FieldDescriptor,
    registry: &DefaultRegistry,
) -> Result<Option<Value>> {
    if field.is_repeated() {
        return Err(kind_error(ty, field, "a single-valued field"));
    }
    if field.element_type().is_some() {
        return Err(kind_error(ty, field, "an attribute or text field"));
    }

    if let Some(raw) = raw_value(doc, node, field) {
        if let Some(value) = decode(raw, field)? {
            return Ok(Some(value));
        }
    }
    if let Some(group) = field.choice {
        if active_choice(doc, node, ty, group)?.is_some_and(|member| member != field.name) {
            return Ok(None);
        }
    }

    let default = registry
        .get_default(ty.name, field.name)
        .or(field.default);
    match default {
        Some(raw) => decode(raw, field),
        None if field.cardinality == Cardinality::Required => Err(Error::MissingField {
            element_type: ty.name.to_string(),
            field: field.name.to_string(),
        }),
        None => Ok(None),
    }
}

/// Read every value of a repeated text field, in document order
///
/// Indentation inside each element is collapsed; empty elements are skipped.
pub fn read_list(
    doc: &Document,
    node: NodeId,
    ty: &ElementType,
    field: &FieldDescriptor,
) -> Result<Vec<Value>> {
    if !matches!(field.source, Source::Text(_)) {
        return Err(kind_error(ty, field, "a text field"));
    }

    let mut values = Vec::new();
    for child in doc.find_children(node, field.name) {
        let text = normalize_inner_text(doc.text(child).unwrap_or_default());
        if let Some(value) = decode(&text, field)? {
            values.push(value);
        }
    }
    Ok(values)
}

/// Write a scalar field
///
/// Attributes are set in place; a text child is updated in place or created at
/// its schema position. Writing a repeated text field replaces the whole list
/// with `value`.
pub fn write(
    doc: &mut Document,
    node: NodeId,
    ty: &ElementType,
    field: &FieldDescriptor,
    value: &Value,
) -> Result<()> {
    if field.element_type().is_some() {
        return Err(kind_error(ty, field, "an attribute or text field"));
    }
    if field.is_repeated() {
        return write_list(doc, node, ty, field, std::slice::from_ref(value));
    }

    let raw = encode(value, field)?;
    clear_choice(doc, node, ty, field)?;

    match field.source {
        Source::Attribute(_) => doc.set_attribute(node, field.name, raw),
        Source::Text(_) => match doc.find_child(node, field.name) {
            Some(child) => doc.set_text(child, Some(raw)),
            None => {
                let child = insert_at_schema_position(doc, node, ty, field);
                doc.set_text(child, Some(raw));
            }
        },
        Source::Element(_) => {}
    }

    trace!(element_type = ty.name, field = field.name, value = %value, "wrote field");
    Ok(())
}

/// Replace every value of a repeated text field
///
/// All values are encoded before the tree is touched, so a rejected value
/// leaves the element unchanged.
pub fn write_list(
    doc: &mut Document,
    node: NodeId,
    ty: &ElementType,
    field: &FieldDescriptor,
    values: &[Value],
) -> Result<()> {
    if !matches!(field.source, Source::Text(_)) {
        return Err(kind_error(ty, field, "a text field"));
    }
    if !field.is_repeated() && values.len() > 1 {
        return Err(kind_error(ty, field, "a repeated text field"));
    }

    let raws = values
        .iter()
        .map(|value| encode(value, field))
        .collect::<Result<Vec<_>>>()?;

    if !raws.is_empty() {
        clear_choice(doc, node, ty, field)?;
    }
    remove_children(doc, node, field.name);

    for raw in raws {
        let child = insert_at_schema_position(doc, node, ty, field);
        doc.set_text(child, Some(raw));
    }

    trace!(element_type = ty.name, field = field.name, count = values.len(), "wrote list");
    Ok(())
}

/// Remove a field's attribute or all of its child elements
pub fn remove(doc: &mut Document, node: NodeId, field: &FieldDescriptor) {
    match field.source {
        Source::Attribute(_) => {
            doc.remove_attribute(node, field.name);
        }
        Source::Text(_) | Source::Element(_) => remove_children(doc, node, field.name),
    }
}

fn remove_children(doc: &mut Document, node: NodeId, tag: &str) {
    for child in doc.find_children(node, tag) {
        doc.remove_child(node, child);
    }
}

// =============================================================================
// Element fields
// =============================================================================

/// First child element bound to `field`
pub fn child(
    doc: &Document,
    node: NodeId,
    ty: &ElementType,
    field: &FieldDescriptor,
) -> Result<Option<NodeId>> {
    if field.element_type().is_none() {
        return Err(kind_error(ty, field, "an element field"));
    }
    Ok(doc.find_child(node, field.name))
}

/// All child elements bound to `field`, in document order
///
/// The list is rebuilt from the tree on every call.
pub fn children(
    doc: &Document,
    node: NodeId,
    ty: &ElementType,
    field: &FieldDescriptor,
) -> Result<Vec<NodeId>> {
    if field.element_type().is_none() {
        return Err(kind_error(ty, field, "an element field"));
    }
    Ok(doc.find_children(node, field.name))
}

/// Create a new child element for `field` at its schema position
///
/// Fails for a single-valued field that already has its element.
pub fn append_child(
    doc: &mut Document,
    node: NodeId,
    ty: &ElementType,
    field: &FieldDescriptor,
) -> Result<NodeId> {
    if field.element_type().is_none() {
        return Err(kind_error(ty, field, "an element field"));
    }
    if !field.is_repeated() && doc.find_child(node, field.name).is_some() {
        return Err(kind_error(ty, field, "a repeated element field"));
    }

    clear_choice(doc, node, ty, field)?;
    let child = insert_at_schema_position(doc, node, ty, field);
    trace!(element_type = ty.name, field = field.name, "appended child");
    Ok(child)
}

/// Existing child element for `field`, created if absent
pub fn ensure_child(
    doc: &mut Document,
    node: NodeId,
    ty: &ElementType,
    field: &FieldDescriptor,
) -> Result<NodeId> {
    match child(doc, node, ty, field)? {
        Some(existing) => Ok(existing),
        None => append_child(doc, node, ty, field),
    }
}

// =============================================================================
// Choice groups and ordering
// =============================================================================

/// Member of choice group `group` present on `node`, if any
pub fn active_choice(
    doc: &Document,
    node: NodeId,
    ty: &ElementType,
    group: &str,
) -> Result<Option<&'static str>> {
    let group = ty.require_choice(group)?;
    for member in group.members {
        let field = ty.require_field(member)?;
        if is_present(doc, node, field) {
            return Ok(Some(field.name));
        }
    }
    Ok(None)
}

/// Remove every other member of `field`'s choice group
fn clear_choice(
    doc: &mut Document,
    node: NodeId,
    ty: &ElementType,
    field: &FieldDescriptor,
) -> Result<()> {
    let Some(group_id) = field.choice else {
        return Ok(());
    };
    let group = ty.require_choice(group_id)?;
    for member in group.members.iter().filter(|m| **m != field.name) {
        let other = ty.require_field(member)?;
        let existed = doc.attribute(node, other.name).is_some()
            || doc.find_child(node, other.name).is_some();
        if existed {
            trace!(element_type = ty.name, removed = other.name, kept = field.name, "switched choice");
            remove(doc, node, other);
        }
    }
    Ok(())
}

/// Create the element for `field` and insert it before the first sibling
/// whose field is declared later
fn insert_at_schema_position(
    doc: &mut Document,
    node: NodeId,
    ty: &ElementType,
    field: &FieldDescriptor,
) -> NodeId {
    let position = ty.position(field.name).unwrap_or(usize::MAX);
    let index = doc
        .children(node)
        .iter()
        .position(|sibling| {
            ty.position(doc.node(*sibling).local_name())
                .map_or(false, |p| p > position)
        })
        .unwrap_or(doc.children(node).len());

    let child = doc.create_element(node, field.name);
    doc.insert_child(node, index, child);
    child
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Generation;
    use pretty_assertions::assert_eq;

    const V2: &str = "http://www.EcoInvent.org/EcoSpold02";

    fn v2_type(name: &str) -> &'static ElementType {
        Generation::V2.schema().element_type(name).unwrap()
    }

    fn child_tags(doc: &Document, node: NodeId) -> Vec<String> {
        doc.children(node)
            .iter()
            .map(|c| doc.node(*c).local_name().to_string())
            .collect()
    }

    #[test]
    fn test_read_falls_back_to_defaults() {
        let doc = Document::with_root(V2, "technology");
        let ty = v2_type("Technology");
        let field = ty.field("technologyLevel").unwrap();

        let empty = DefaultRegistry::default();
        assert_eq!(
            read(&doc, doc.root(), ty, field, &empty).unwrap(),
            Some(Value::Integer(3))
        );

        let mut table = crate::config::DefaultTable::new();
        table
            .entry("Technology".to_string())
            .or_default()
            .insert("technologyLevel".to_string(), "1".to_string());
        let registry = DefaultRegistry::new(table);
        assert_eq!(
            read(&doc, doc.root(), ty, field, &registry).unwrap(),
            Some(Value::Integer(1))
        );
    }

    #[test]
    fn test_inactive_choice_member_ignores_defaults() {
        let mut doc = Document::with_root(V2, "intermediateExchange");
        let root = doc.root();
        let ty = v2_type("IntermediateExchange");
        let input = ty.field("inputGroup").unwrap();
        let output = ty.field("outputGroup").unwrap();

        let mut table = crate::config::DefaultTable::new();
        table
            .entry("IntermediateExchange".to_string())
            .or_default()
            .insert("inputGroup".to_string(), "5".to_string());
        let registry = DefaultRegistry::new(table);

        // No member present yet
        assert_eq!(
            read(&doc, root, ty, input, &registry).unwrap(),
            Some(Value::Integer(5))
        );

        write(&mut doc, root, ty, output, &Value::Integer(0)).unwrap();
        assert_eq!(read(&doc, root, ty, input, &registry).unwrap(), None);
        assert_eq!(
            read(&doc, root, ty, output, &registry).unwrap(),
            Some(Value::Integer(0))
        );
    }

    #[test]
    fn test_required_without_default_fails() {
        let doc = Document::with_root(V2, "geography");
        let ty = v2_type("Geography");
        let field = ty.field("geographyId").unwrap();
        assert!(matches!(
            read(&doc, doc.root(), ty, field, &DefaultRegistry::default()),
            Err(Error::MissingField { .. })
        ));
    }

    #[test]
    fn test_write_keeps_schema_order() {
        let mut doc = Document::with_root(V2, "property");
        let root = doc.root();
        let ty = v2_type("Property");

        write(&mut doc, root, ty, ty.field("comment").unwrap(), &Value::from("c")).unwrap();
        write_list(&mut doc, root, ty, ty.field("name").unwrap(), &[Value::from("n")]).unwrap();
        write_list(&mut doc, root, ty, ty.field("unitName").unwrap(), &[Value::from("kg")])
            .unwrap();

        assert_eq!(child_tags(&doc, root), vec!["name", "unitName", "comment"]);
    }

    #[test]
    fn test_text_updated_in_place() {
        let mut doc = Document::with_root(V2, "uncertainty");
        let root = doc.root();
        let ty = v2_type("Uncertainty");
        let field = ty.field("comment").unwrap();

        write(&mut doc, root, ty, field, &Value::from("first")).unwrap();
        let first = doc.find_child(root, "comment").unwrap();
        write(&mut doc, root, ty, field, &Value::from("second")).unwrap();

        assert_eq!(doc.find_child(root, "comment"), Some(first));
        assert_eq!(doc.text(first), Some("second"));
    }

    #[test]
    fn test_read_list_collapses_indentation() {
        let xml = format!(
            "<activity xmlns=\"{}\"><synonym>  a\n  b </synonym><synonym/><synonym>c</synonym></activity>",
            V2
        );
        let doc = Document::from_str(&xml).unwrap();
        let ty = v2_type("Activity");
        let values = read_list(&doc, doc.root(), ty, ty.field("synonym").unwrap()).unwrap();
        assert_eq!(values, vec![Value::from("a b"), Value::from("c")]);
    }

    #[test]
    fn test_choice_switch_removes_other_member() {
        let mut doc = Document::with_root(V2, "uncertainty");
        let root = doc.root();
        let ty = v2_type("Uncertainty");

        append_child(&mut doc, root, ty, ty.field("normal").unwrap()).unwrap();
        assert_eq!(active_choice(&doc, root, ty, "distribution").unwrap(), Some("normal"));

        ensure_child(&mut doc, root, ty, ty.field("uniform").unwrap()).unwrap();
        assert_eq!(active_choice(&doc, root, ty, "distribution").unwrap(), Some("uniform"));
        assert!(doc.find_child(root, "normal").is_none());
    }

    #[test]
    fn test_kind_mismatch() {
        let mut doc = Document::with_root(V2, "flowData");
        let root = doc.root();
        let ty = v2_type("FlowData");
        let field = ty.field("parameter").unwrap();
        assert!(matches!(
            read(&doc, root, ty, field, &DefaultRegistry::default()),
            Err(Error::FieldKind { .. })
        ));
        assert!(matches!(
            write(&mut doc, root, ty, field, &Value::from("x")),
            Err(Error::FieldKind { .. })
        ));
    }

    #[test]
    fn test_rejected_value_leaves_tree_untouched() {
        let mut doc = Document::with_root(V2, "technology");
        let root = doc.root();
        let ty = v2_type("Technology");
        let field = ty.field("technologyLevel").unwrap();
        assert!(write(&mut doc, root, ty, field, &Value::Integer(9)).is_err());
        assert_eq!(doc.attribute(root, "technologyLevel"), None);
    }
}

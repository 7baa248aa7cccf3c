//! JSON export
//!
//! Converts a data object graph to JSON by walking the element type
//! descriptors: one JSON object per element, keyed by field name, with only
//! the fields present in the tree. Repeated fields become arrays and child
//! elements nest recursively. Values that do not decode under their field's
//! type are exported as their raw text.

use serde_json::{Map, Number, Value as JsonValue};

use crate::binder;
use crate::coercion::{Value, DATE_FORMAT, DATETIME_FORMAT};
use crate::dataobject::DataObject;
use crate::schema::{FieldDescriptor, Source};

/// Convert a typed value to JSON
///
/// Dates use ISO 8601; registry codes use their dashed form.
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Integer(i) => JsonValue::Number((*i).into()),
        Value::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
        Value::Boolean(b) => JsonValue::Bool(*b),
        Value::Date(d) => JsonValue::String(d.format(DATE_FORMAT).to_string()),
        Value::DateTime(dt) => JsonValue::String(dt.format(DATETIME_FORMAT).to_string()),
        Value::RegistryCode(code) => JsonValue::String(code.to_string()),
    }
}

fn scalar_to_json(object: &DataObject<'_>, field: &FieldDescriptor) -> Option<JsonValue> {
    if !object.is_present(field.name).unwrap_or(false) {
        return None;
    }
    match object.get(field.name) {
        Ok(Some(value)) => Some(value_to_json(&value)),
        Ok(None) => None,
        Err(_) => binder::raw_value(object.dataset().document(), object.node_id(), field)
            .map(|raw| JsonValue::String(raw.to_string())),
    }
}

fn list_to_json(object: &DataObject<'_>, field: &FieldDescriptor) -> Option<JsonValue> {
    let doc = object.dataset().document();
    let nodes = doc.find_children(object.node_id(), field.name);
    if nodes.is_empty() {
        return None;
    }
    let values = match object.get_list(field.name) {
        Ok(values) => values.iter().map(value_to_json).collect(),
        Err(_) => nodes
            .into_iter()
            .map(|n| JsonValue::String(doc.text(n).unwrap_or_default().to_string()))
            .collect(),
    };
    Some(JsonValue::Array(values))
}

fn element_to_json(object: &DataObject<'_>, field: &FieldDescriptor) -> Option<JsonValue> {
    if field.is_repeated() {
        let children = object.children(field.name).ok()?;
        if children.is_empty() {
            return None;
        }
        return Some(JsonValue::Array(children.iter().map(to_json).collect()));
    }
    object.child(field.name).ok().flatten().map(|child| to_json(&child))
}

/// Convert `object` and everything below it to JSON
pub fn to_json(object: &DataObject<'_>) -> JsonValue {
    let mut map = Map::new();
    for field in object.fields() {
        let value = match field.source {
            Source::Element(_) => element_to_json(object, field),
            _ if field.is_repeated() => list_to_json(object, field),
            _ => scalar_to_json(object, field),
        };
        if let Some(value) = value {
            map.insert(field.name.to_string(), value);
        }
    }
    JsonValue::Object(map)
}

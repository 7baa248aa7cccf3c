//! Compiled schema metadata
//!
//! Each supported EcoSpold generation is described by a static [`Schema`]: a
//! closed set of [`ElementType`]s, each listing its [`FieldDescriptor`]s in
//! schema order. The binder, the validator and the default registry are all
//! driven from these tables; nothing is looked up by reflection.

pub mod v1;
pub mod v2;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::coercion::SemanticType;
use crate::error::{Error, Result};

// =============================================================================
// Field descriptors
// =============================================================================

/// Where a field's value lives in the XML
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source {
    /// An attribute on the element itself
    Attribute(SemanticType),
    /// The text of a simple-content child element named after the field
    Text(SemanticType),
    /// A nested complex child element of the named element type
    Element(&'static str),
}

/// How many times a field may occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly once (unless a default covers it)
    Required,
    /// Zero or one time
    Optional,
    /// Zero or more times
    Repeated,
}

/// Declarative description of one field of an element type
///
/// The field name is also the attribute name or child tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDescriptor {
    /// Field name (attribute name or child tag)
    pub name: &'static str,
    /// Where the value is stored
    pub source: Source,
    /// Occurrence constraint
    pub cardinality: Cardinality,
    /// Schema-declared default literal
    pub default: Option<&'static str>,
    /// Choice group this field belongs to
    pub choice: Option<&'static str>,
}

impl FieldDescriptor {
    const fn new(name: &'static str, source: Source, cardinality: Cardinality) -> Self {
        Self {
            name,
            source,
            cardinality,
            default: None,
            choice: None,
        }
    }

    /// Optional attribute
    pub const fn attribute(name: &'static str, ty: SemanticType) -> Self {
        Self::new(name, Source::Attribute(ty), Cardinality::Optional)
    }

    /// Optional simple-content child
    pub const fn text(name: &'static str, ty: SemanticType) -> Self {
        Self::new(name, Source::Text(ty), Cardinality::Optional)
    }

    /// Repeated simple-content child
    pub const fn text_list(name: &'static str, ty: SemanticType) -> Self {
        Self::new(name, Source::Text(ty), Cardinality::Repeated)
    }

    /// Optional complex child
    pub const fn child(name: &'static str, element_type: &'static str) -> Self {
        Self::new(name, Source::Element(element_type), Cardinality::Optional)
    }

    /// Repeated complex child
    pub const fn children(name: &'static str, element_type: &'static str) -> Self {
        Self::new(name, Source::Element(element_type), Cardinality::Repeated)
    }

    /// Mark the field as required
    pub const fn required(mut self) -> Self {
        self.cardinality = Cardinality::Required;
        self
    }

    /// Attach a schema default
    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    /// Place the field in a choice group
    pub const fn in_choice(mut self, group: &'static str) -> Self {
        self.choice = Some(group);
        self
    }

    /// Semantic type for attribute and text fields
    pub fn semantic_type(&self) -> Option<&SemanticType> {
        match &self.source {
            Source::Attribute(ty) | Source::Text(ty) => Some(ty),
            Source::Element(_) => None,
        }
    }

    /// Element type of a complex child field
    pub fn element_type(&self) -> Option<&'static str> {
        match self.source {
            Source::Element(name) => Some(name),
            _ => None,
        }
    }

    /// True for fields stored as attributes
    pub fn is_attribute(&self) -> bool {
        matches!(self.source, Source::Attribute(_))
    }

    /// True for fields stored as child elements
    pub fn is_child(&self) -> bool {
        !self.is_attribute()
    }

    /// True if the field may occur more than once
    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }

    /// Human readable kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match (&self.source, self.cardinality) {
            (Source::Attribute(_), _) => "an attribute field",
            (Source::Text(_), Cardinality::Repeated) => "a repeated text field",
            (Source::Text(_), _) => "a text field",
            (Source::Element(_), Cardinality::Repeated) => "a repeated element field",
            (Source::Element(_), _) => "an element field",
        }
    }
}

/// Set of mutually exclusive fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceGroup {
    /// Group id referenced by [`FieldDescriptor::choice`]
    pub id: &'static str,
    /// Member field names
    pub members: &'static [&'static str],
}

// =============================================================================
// Element types
// =============================================================================

/// A named kind of element with a closed set of fields
#[derive(Debug, PartialEq)]
pub struct ElementType {
    /// Type name, also the key into the default registry
    pub name: &'static str,
    /// Fields in schema order
    pub fields: &'static [FieldDescriptor],
    /// Choice groups
    pub choices: &'static [ChoiceGroup],
}

impl ElementType {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        let fields: &'static [FieldDescriptor] = self.fields;
        fields.iter().find(|f| f.name == name)
    }

    /// Look up a field, failing with [`Error::UnknownField`]
    pub fn require_field(&self, name: &str) -> Result<&'static FieldDescriptor> {
        self.field(name).ok_or_else(|| Error::UnknownField {
            element_type: self.name.to_string(),
            field: name.to_string(),
        })
    }

    /// Position of a field in schema order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Child field (text or element) stored under `tag`
    pub fn child_field(&self, tag: &str) -> Option<&'static FieldDescriptor> {
        self.field(tag).filter(|f| f.is_child())
    }

    /// Attribute field called `name`
    pub fn attribute_field(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.field(name).filter(|f| f.is_attribute())
    }

    /// Look up a choice group
    pub fn choice(&self, id: &str) -> Option<&'static ChoiceGroup> {
        let choices: &'static [ChoiceGroup] = self.choices;
        choices.iter().find(|c| c.id == id)
    }

    /// Look up a choice group, failing with [`Error::UnknownField`]
    pub fn require_choice(&self, id: &str) -> Result<&'static ChoiceGroup> {
        self.choice(id).ok_or_else(|| Error::UnknownField {
            element_type: self.name.to_string(),
            field: id.to_string(),
        })
    }
}

// =============================================================================
// Schemas
// =============================================================================

/// EcoSpold schema generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Generation {
    /// EcoSpold 1 (EcoSpold01)
    #[serde(rename = "v1")]
    V1,
    /// EcoSpold 2 (EcoSpold02)
    #[serde(rename = "v2")]
    V2,
}

impl Generation {
    /// The compiled schema for this generation
    pub fn schema(self) -> &'static Schema {
        match self {
            Generation::V1 => &v1::SCHEMA,
            Generation::V2 => &v2::SCHEMA,
        }
    }

    /// Target namespace
    pub fn namespace(self) -> &'static str {
        self.schema().namespace
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generation::V1 => write!(f, "v1"),
            Generation::V2 => write!(f, "v2"),
        }
    }
}

impl FromStr for Generation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "v1" | "1" | "ecospold1" => Ok(Generation::V1),
            "v2" | "2" | "ecospold2" => Ok(Generation::V2),
            other => Err(Error::Config(format!("unknown EcoSpold generation '{}'", other))),
        }
    }
}

/// Compiled description of one schema generation
#[derive(Debug)]
pub struct Schema {
    /// Generation described
    pub generation: Generation,
    /// Target namespace
    pub namespace: &'static str,
    /// Root element tag
    pub root_tag: &'static str,
    /// Element type of the root
    pub root_type: &'static str,
    /// All element types
    pub types: &'static [ElementType],
}

impl Schema {
    /// Look up an element type by name
    pub fn element_type(&self, name: &str) -> Option<&'static ElementType> {
        let types: &'static [ElementType] = self.types;
        types.iter().find(|t| t.name == name)
    }

    /// Element type of the document root
    pub fn root(&self) -> Result<&'static ElementType> {
        self.resolve(self.root_type)
    }

    /// Look up an element type that a field refers to
    pub fn resolve(&self, name: &str) -> Result<&'static ElementType> {
        self.element_type(name)
            .ok_or_else(|| Error::Config(format!("element type '{}' is not defined", name)))
    }

    /// Element type bound to `field`, if it is a complex child
    pub fn child_type(&self, field: &FieldDescriptor) -> Result<Option<&'static ElementType>> {
        match field.element_type() {
            Some(name) => self.resolve(name).map(Some),
            None => Ok(None),
        }
    }
}

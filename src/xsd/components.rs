//! Compiled schema components
//!
//! Element and attribute declarations, complex types and the particles of
//! their content models. Named complex types are referenced by name and
//! looked up when a document is validated, so recursive type definitions
//! need no cycles between `Arc`s.

use std::sync::Arc;

use super::simple_types::SimpleType;
use crate::namespaces::QName;

/// Occurrence constraints of a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences
    pub min: u32,
    /// Maximum number of occurrences (`None` is unbounded)
    pub max: Option<u32>,
}

impl Occurs {
    /// Exactly once
    pub const ONCE: Occurs = Occurs { min: 1, max: Some(1) };

    /// Create occurrence constraints
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// True if another occurrence is allowed after `count`
    pub fn allows_more(&self, count: u32) -> bool {
        self.max.map_or(true, |max| count < max)
    }

    /// True if the particle may be skipped
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }
}

/// Namespaces matched by a wildcard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceConstraint {
    /// `##any`
    Any,
    /// `##other`: any namespace except the target namespace and no namespace
    Other(Option<String>),
    /// Explicit list; `None` stands for `##local`
    List(Vec<Option<String>>),
}

/// How wildcard matches are validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessContents {
    /// Must match a global declaration
    Strict,
    /// Validated if a declaration exists
    Lax,
    /// Not validated
    Skip,
}

/// `xs:any` or `xs:anyAttribute`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wildcard {
    /// Allowed namespaces
    pub namespaces: NamespaceConstraint,
    /// Validation of matched items
    pub process_contents: ProcessContents,
}

impl Wildcard {
    /// True if an item in `namespace` is allowed
    pub fn allows(&self, namespace: Option<&str>) -> bool {
        match &self.namespaces {
            NamespaceConstraint::Any => true,
            NamespaceConstraint::Other(target) => {
                namespace.is_some() && namespace != target.as_deref()
            }
            NamespaceConstraint::List(list) => list.iter().any(|ns| ns.as_deref() == namespace),
        }
    }
}

/// Type of an element
#[derive(Debug, Clone)]
pub enum TypeRef {
    /// Simple content, no attributes
    Simple(Arc<SimpleType>),
    /// Named complex type, resolved through the schema
    Named(QName),
    /// Anonymous complex type
    Complex(Arc<ComplexType>),
    /// `xs:anyType`: anything goes
    Any,
}

/// Element declaration
#[derive(Debug, Clone)]
pub struct ElementDecl {
    /// Local name
    pub name: String,
    /// Namespace the element lives in
    pub namespace: Option<String>,
    /// Element type
    pub type_ref: TypeRef,
    /// `nillable="true"`
    pub nillable: bool,
    /// Fixed value of simple content
    pub fixed: Option<String>,
}

impl ElementDecl {
    /// True if this declaration is for `{namespace}local_name`
    pub fn matches(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.name == local_name && self.namespace.as_deref() == namespace
    }

    /// Name for messages
    pub fn display_name(&self) -> &str {
        &self.name
    }
}

/// Term of a particle
#[derive(Debug, Clone)]
pub enum Term {
    /// Local element declaration
    Element(Arc<ElementDecl>),
    /// Reference to a global element, by qualified name
    ElementRef {
        /// Namespace of the referenced element
        namespace: Option<String>,
        /// Local name of the referenced element
        name: String,
    },
    /// Children in order
    Sequence(Vec<Particle>),
    /// One of the children
    Choice(Vec<Particle>),
    /// Every child once, in any order
    All(Vec<Particle>),
    /// Wildcard
    Any(Wildcard),
}

/// Term with occurrence constraints
#[derive(Debug, Clone)]
pub struct Particle {
    /// What occurs
    pub term: Term,
    /// How often it occurs
    pub occurs: Occurs,
}

impl Particle {
    /// Create a particle
    pub fn new(term: Term, occurs: Occurs) -> Self {
        Self { term, occurs }
    }

    /// An empty sequence, matching nothing
    pub fn empty() -> Self {
        Self::new(Term::Sequence(Vec::new()), Occurs::ONCE)
    }
}

/// Attribute use requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeUse {
    /// May be absent
    Optional,
    /// Must be present
    Required,
    /// Must be absent
    Prohibited,
}

/// Attribute declaration with its use on a complex type
#[derive(Debug, Clone)]
pub struct AttributeDecl {
    /// Local name
    pub name: String,
    /// Namespace (set for `xml:lang` and qualified attributes)
    pub namespace: Option<String>,
    /// Value type
    pub simple_type: Arc<SimpleType>,
    /// Requirement
    pub usage: AttributeUse,
    /// Fixed value
    pub fixed: Option<String>,
}

impl AttributeDecl {
    /// True if this declaration is for `{namespace}local_name`
    pub fn matches(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.name == local_name && self.namespace.as_deref() == namespace
    }
}

/// Content of a complex type
#[derive(Debug, Clone)]
pub enum Content {
    /// No children, no text
    Empty,
    /// Text of a simple type
    Simple(Arc<SimpleType>),
    /// Child elements, with text allowed in between if `mixed`
    Elements {
        /// Content model
        particle: Particle,
        /// Mixed content
        mixed: bool,
    },
}

/// Complex type definition
#[derive(Debug, Clone)]
pub struct ComplexType {
    /// Type name, `None` for anonymous types
    pub name: Option<String>,
    /// Content
    pub content: Content,
    /// Declared attributes, including inherited ones
    pub attributes: Vec<AttributeDecl>,
    /// Attribute wildcard
    pub any_attribute: Option<Wildcard>,
}

impl ComplexType {
    /// Find the attribute declaration for `{namespace}local_name`
    pub fn attribute(&self, namespace: Option<&str>, local_name: &str) -> Option<&AttributeDecl> {
        self.attributes
            .iter()
            .find(|a| a.matches(namespace, local_name))
    }

    /// Name for messages
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurs() {
        let optional = Occurs::new(0, Some(1));
        assert!(optional.is_emptiable());
        assert!(optional.allows_more(0));
        assert!(!optional.allows_more(1));
        assert!(Occurs::new(1, None).allows_more(1000));
        assert!(!Occurs::ONCE.is_emptiable());
    }

    #[test]
    fn test_wildcard_namespaces() {
        let other = Wildcard {
            namespaces: NamespaceConstraint::Other(Some("urn:target".into())),
            process_contents: ProcessContents::Lax,
        };
        assert!(other.allows(Some("urn:elsewhere")));
        assert!(!other.allows(Some("urn:target")));
        assert!(!other.allows(None));

        let local = Wildcard {
            namespaces: NamespaceConstraint::List(vec![None]),
            process_contents: ProcessContents::Skip,
        };
        assert!(local.allows(None));
        assert!(!local.allows(Some("urn:target")));
    }
}

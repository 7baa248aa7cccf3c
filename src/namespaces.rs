//! XML namespace handling
//!
//! Qualified names and the scoped prefix resolution used while building a
//! [`Document`](crate::documents::Document) from XML text.

use std::fmt;

use crate::error::{ParseError, Result};

/// XML namespace (bound to the `xml` prefix)
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XML Schema instance namespace (`xsi:schemaLocation` and friends)
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Qualified name (QName) - combination of namespace and local name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    /// Namespace URI (None for no namespace)
    pub namespace: Option<String>,
    /// Local name
    pub local_name: String,
}

impl QName {
    /// Create a QName without a namespace
    pub fn local(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    /// Create a QName with a namespace
    pub fn namespaced(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    /// True if this name lives in `namespace` and is called `local_name`
    pub fn matches(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == namespace
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local_name),
            None => write!(f, "{}", self.local_name),
        }
    }
}

/// Split `prefix:local` into its parts
pub fn split_prefixed(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// Stack of in-scope namespace declarations
///
/// Each element pushes one scope holding the `xmlns` declarations found on
/// its start tag; the scope is popped at the matching end tag.
#[derive(Debug, Clone, Default)]
pub struct NamespaceScopes {
    /// Each entry maps a prefix ("" for the default namespace) to a URI
    scopes: Vec<Vec<(String, String)>>,
}

impl NamespaceScopes {
    /// Create an empty scope stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter an element carrying `declarations`
    pub fn push(&mut self, declarations: Vec<(String, String)>) {
        self.scopes.push(declarations);
    }

    /// Leave the innermost element
    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Look up the URI bound to `prefix` ("" for the default namespace)
    pub fn lookup(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    /// Resolve an element name; unprefixed names take the default namespace
    pub fn resolve_element(&self, name: &str) -> Result<QName> {
        let (prefix, local) = split_prefixed(name);
        match prefix {
            Some(p) => self
                .lookup(p)
                .map(|ns| QName::namespaced(ns, local))
                .ok_or_else(|| ParseError::new(format!("unbound namespace prefix '{}'", p)).into()),
            None => Ok(match self.lookup("") {
                Some(ns) => QName::namespaced(ns, local),
                None => QName::local(local),
            }),
        }
    }

    /// Resolve an attribute name; unprefixed attributes have no namespace
    pub fn resolve_attribute(&self, name: &str) -> Result<QName> {
        let (prefix, local) = split_prefixed(name);
        match prefix {
            Some(p) => self
                .lookup(p)
                .map(|ns| QName::namespaced(ns, local))
                .ok_or_else(|| ParseError::new(format!("unbound namespace prefix '{}'", p)).into()),
            None => Ok(QName::local(local)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_display() {
        let qname = QName::namespaced("http://example.com", "element");
        assert_eq!(qname.to_string(), "{http://example.com}element");
        assert_eq!(QName::local("element").to_string(), "element");
    }

    #[test]
    fn test_default_namespace_applies_to_elements_only() {
        let mut scopes = NamespaceScopes::new();
        scopes.push(vec![("".to_string(), "urn:a".to_string())]);

        let elem = scopes.resolve_element("dataset").unwrap();
        assert!(elem.matches(Some("urn:a"), "dataset"));

        let attr = scopes.resolve_attribute("number").unwrap();
        assert!(attr.matches(None, "number"));
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut scopes = NamespaceScopes::new();
        scopes.push(vec![("es".to_string(), "urn:outer".to_string())]);
        scopes.push(vec![("es".to_string(), "urn:inner".to_string())]);
        assert_eq!(scopes.lookup("es"), Some("urn:inner"));
        scopes.pop();
        assert_eq!(scopes.lookup("es"), Some("urn:outer"));
    }

    #[test]
    fn test_unbound_prefix_is_a_parse_error() {
        let scopes = NamespaceScopes::new();
        assert!(scopes.resolve_element("x:foo").is_err());
        assert_eq!(scopes.lookup("xml"), Some(XML_NAMESPACE));
    }
}

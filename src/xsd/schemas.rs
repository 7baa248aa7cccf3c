//! Compiled XML Schemas
//!
//! [`XsdSchema`] holds the components compiled from one schema document and
//! everything it includes. The EcoSpold schemas ship with the crate; a
//! configured schema file replaces the bundled one for its generation.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::documents::Document;
use crate::error::{Error, Result};
use crate::namespaces::QName;
use crate::schema::Generation;
use crate::validation::ConformanceIssue;

use super::components::{ComplexType, ElementDecl};
use super::document_validation::validate_document;
use super::parsing::{collect_sources, compile};
use super::simple_types::SimpleType;

/// EcoSpold 1 dataset schema
pub const ECOSPOLD01_XSD: &str = include_str!("../../schemas/EcoSpold01Dataset.xsd");

/// EcoSpold 2 dataset schema
pub const ECOSPOLD02_XSD: &str = include_str!("../../schemas/EcoSpold02.xsd");

/// A compiled XML Schema
#[derive(Debug)]
pub struct XsdSchema {
    source: String,
    target_namespace: Option<String>,
    elements: HashMap<QName, Arc<ElementDecl>>,
    complex_types: HashMap<QName, Arc<ComplexType>>,
    simple_types: HashMap<QName, Arc<SimpleType>>,
}

impl XsdSchema {
    /// Compile a schema file and the documents it includes
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Xsd(format!("failed to read '{}': {}", path.display(), e)))?;
        Self::build(text, path.display().to_string(), path.parent())
    }

    /// Compile schema text; `source` names it in messages
    ///
    /// Relative `schemaLocation`s cannot be resolved and are an error.
    pub fn from_text(text: &str, source: impl Into<String>) -> Result<Self> {
        Self::build(text.to_string(), source.into(), None)
    }

    /// The schema shipped with the crate for `generation`
    pub fn bundled(generation: Generation) -> Result<Self> {
        match generation {
            Generation::V1 => Self::from_text(ECOSPOLD01_XSD, "EcoSpold01Dataset.xsd"),
            Generation::V2 => Self::from_text(ECOSPOLD02_XSD, "EcoSpold02.xsd"),
        }
    }

    fn build(text: String, source: String, base_dir: Option<&Path>) -> Result<Self> {
        let sources = collect_sources(text, source.clone(), base_dir)?;
        let compiled = compile(&sources)?;
        debug!(
            source = %source,
            documents = sources.len(),
            elements = compiled.elements.len(),
            "loaded schema"
        );
        Ok(Self {
            source,
            target_namespace: compiled.target_namespace,
            elements: compiled.elements,
            complex_types: compiled.complex_types,
            simple_types: compiled.simple_types,
        })
    }

    /// A schema without components
    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Self {
            source: "empty".to_string(),
            target_namespace: None,
            elements: HashMap::new(),
            complex_types: HashMap::new(),
            simple_types: HashMap::new(),
        }
    }

    /// File or name the schema was read from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Declared `targetNamespace`
    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref()
    }

    /// Global element declaration for `{namespace}local_name`
    pub fn global_element(&self, namespace: Option<&str>, local_name: &str) -> Option<Arc<ElementDecl>> {
        self.elements
            .iter()
            .find(|(qname, _)| qname.matches(namespace, local_name))
            .map(|(_, decl)| decl.clone())
    }

    /// True if `local_name` is declared as a global element in the target namespace
    pub fn declares(&self, local_name: &str) -> bool {
        self.global_element(self.target_namespace(), local_name).is_some()
    }

    /// Named complex type
    pub fn complex_type(&self, qname: &QName) -> Option<&Arc<ComplexType>> {
        self.complex_types.get(qname)
    }

    /// Named simple type
    pub fn simple_type(&self, qname: &QName) -> Option<&Arc<SimpleType>> {
        self.simple_types.get(qname)
    }

    /// Validate a document, collecting every violation
    pub fn validate(&self, doc: &Document) -> Vec<ConformanceIssue> {
        validate_document(self, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_schemas_compile() {
        let v1 = XsdSchema::bundled(Generation::V1).unwrap();
        assert_eq!(v1.target_namespace(), Some(Generation::V1.schema().namespace));
        assert!(v1.declares("ecoSpold"));
        let start = v1.simple_type(&QName::namespaced(
            Generation::V1.schema().namespace,
            "TTimeStamp",
        ));
        assert!(start.is_some());

        let v2 = XsdSchema::bundled(Generation::V2).unwrap();
        assert_eq!(v2.target_namespace(), Some(Generation::V2.schema().namespace));
        assert!(v2.declares("ecoSpold"));
        assert!(v2
            .complex_type(&QName::namespaced(
                Generation::V2.schema().namespace,
                "TIntermediateExchange"
            ))
            .is_some());
    }

    #[test]
    fn test_from_file_resolves_includes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("common.xsd"),
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                targetNamespace="urn:lab" xmlns="urn:lab">
                <xs:simpleType name="TSample"><xs:restriction base="xs:string"/></xs:simpleType>
            </xs:schema>"#,
        )
        .unwrap();
        let main = dir.path().join("lab.xsd");
        fs::write(
            &main,
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                targetNamespace="urn:lab" xmlns="urn:lab">
                <xs:include schemaLocation="common.xsd"/>
                <xs:element name="sample" type="TSample"/>
            </xs:schema>"#,
        )
        .unwrap();

        let schema = XsdSchema::from_file(&main).unwrap();
        assert!(schema.declares("sample"));
        assert!(schema.source().ends_with("lab.xsd"));

        let missing = XsdSchema::from_file(dir.path().join("absent.xsd"));
        assert!(matches!(missing, Err(Error::Xsd(_))));
    }
}

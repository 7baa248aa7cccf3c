//! XSD document parsing
//!
//! Reads schema documents with `roxmltree`, follows `xs:include` and
//! `xs:import` locations and compiles the global definitions into the
//! components of an [`XsdSchema`](super::schemas::XsdSchema).
//!
//! Groups and attribute groups are inlined where they are referenced.
//! Element types that name a complex type stay references by name.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use roxmltree::Node;
use tracing::debug;

use crate::error::{Error, Result};
use crate::namespaces::{split_prefixed, QName, XML_NAMESPACE};

use super::builtins::Builtin;
use super::components::{
    AttributeDecl, AttributeUse, ComplexType, Content, ElementDecl, NamespaceConstraint, Occurs,
    Particle, ProcessContents, Term, TypeRef, Wildcard,
};
use super::facets::{Facets, Pattern, WhiteSpace};
use super::simple_types::SimpleType;

/// XML Schema namespace
pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// Deepest group reference chain followed while inlining
const MAX_GROUP_DEPTH: usize = 64;

/// One schema document and where it came from
#[derive(Debug, Clone)]
pub(crate) struct SchemaSource {
    pub name: String,
    pub text: String,
    /// Target namespace adopted by an included schema that declares none
    pub chameleon_namespace: Option<String>,
}

/// Components compiled from a set of schema documents
#[derive(Debug, Default)]
pub(crate) struct Compiled {
    pub target_namespace: Option<String>,
    pub elements: HashMap<QName, Arc<ElementDecl>>,
    pub complex_types: HashMap<QName, Arc<ComplexType>>,
    pub simple_types: HashMap<QName, Arc<SimpleType>>,
}

/// Read a schema document and everything it includes or imports
pub(crate) fn collect_sources(
    text: String,
    name: String,
    base_dir: Option<&Path>,
) -> Result<Vec<SchemaSource>> {
    let mut sources = Vec::new();
    let mut seen = HashSet::new();
    collect_into(text, name, base_dir, None, &mut sources, &mut seen)?;
    Ok(sources)
}

fn collect_into(
    text: String,
    name: String,
    base_dir: Option<&Path>,
    chameleon_namespace: Option<String>,
    sources: &mut Vec<SchemaSource>,
    seen: &mut HashSet<PathBuf>,
) -> Result<()> {
    let mut pending: Vec<(PathBuf, Option<String>)> = Vec::new();
    {
        let doc = roxmltree::Document::parse(&text)
            .map_err(|e| Error::Xsd(format!("'{}': {}", name, e)))?;
        let root = schema_root(&doc, &name)?;
        let target = root
            .attribute("targetNamespace")
            .map(str::to_string)
            .or_else(|| chameleon_namespace.clone());

        for child in xsd_children(root) {
            let kind = child.tag_name().name();
            if kind != "include" && kind != "import" && kind != "redefine" {
                continue;
            }
            let Some(location) = child.attribute("schemaLocation") else {
                // Imports without a location only make the namespace known
                continue;
            };
            let Some(dir) = base_dir else {
                return Err(Error::Xsd(format!(
                    "'{}': cannot resolve schemaLocation '{}' without a base directory",
                    name, location
                )));
            };
            let inherited = if kind == "import" { None } else { target.clone() };
            pending.push((dir.join(location), inherited));
        }
    }

    sources.push(SchemaSource {
        name,
        text,
        chameleon_namespace,
    });

    for (path, inherited) in pending {
        let key = path.canonicalize().unwrap_or_else(|_| path.clone());
        if !seen.insert(key) {
            continue;
        }
        let text = fs::read_to_string(&path)
            .map_err(|e| Error::Xsd(format!("failed to read '{}': {}", path.display(), e)))?;
        debug!(path = %path.display(), "loading referenced schema document");
        collect_into(
            text,
            path.display().to_string(),
            path.parent(),
            inherited,
            sources,
            seen,
        )?;
    }
    Ok(())
}

fn schema_root<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    name: &str,
) -> Result<Node<'a, 'input>> {
    let root = doc.root_element();
    if root.tag_name().name() != "schema" || root.tag_name().namespace() != Some(XSD_NAMESPACE) {
        return Err(Error::Xsd(format!("'{}' is not an XML Schema document", name)));
    }
    Ok(root)
}

/// Schema-namespace element children, without annotations
fn xsd_children<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|c| {
        c.is_element()
            && c.tag_name().namespace() == Some(XSD_NAMESPACE)
            && c.tag_name().name() != "annotation"
    })
}

fn first_child<'a, 'input>(node: Node<'a, 'input>, kind: &str) -> Option<Node<'a, 'input>> {
    xsd_children(node).find(|c| c.tag_name().name() == kind)
}

/// Compile every global component of `sources`
pub(crate) fn compile(sources: &[SchemaSource]) -> Result<Compiled> {
    let docs = sources
        .iter()
        .map(|s| {
            roxmltree::Document::parse(&s.text).map_err(|e| Error::Xsd(format!("'{}': {}", s.name, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut compiler = Compiler::default();
    for (index, (doc, source)) in docs.iter().zip(sources).enumerate() {
        let root = schema_root(doc, &source.name)?;
        compiler.add_document(index, root, source)?;
    }
    compiler.compile_all()
}

/// Settings of one schema document
#[derive(Debug, Clone)]
struct DocInfo {
    name: String,
    target_namespace: Option<String>,
    qualified_elements: bool,
    qualified_attributes: bool,
}

#[derive(Clone, Copy)]
struct Def<'a, 'input> {
    doc: usize,
    node: Node<'a, 'input>,
}

#[derive(Default)]
struct Compiler<'a, 'input> {
    docs: Vec<DocInfo>,
    elements: HashMap<QName, Def<'a, 'input>>,
    attributes: HashMap<QName, Def<'a, 'input>>,
    complex_types: HashMap<QName, Def<'a, 'input>>,
    simple_types: HashMap<QName, Def<'a, 'input>>,
    groups: HashMap<QName, Def<'a, 'input>>,
    attribute_groups: HashMap<QName, Def<'a, 'input>>,
    simple_cache: HashMap<QName, Arc<SimpleType>>,
    complex_cache: HashMap<QName, Arc<ComplexType>>,
    in_progress: HashSet<QName>,
}

impl<'a, 'input> Compiler<'a, 'input> {
    fn add_document(&mut self, index: usize, root: Node<'a, 'input>, source: &SchemaSource) -> Result<()> {
        let target_namespace = root
            .attribute("targetNamespace")
            .map(str::to_string)
            .or_else(|| source.chameleon_namespace.clone());
        self.docs.push(DocInfo {
            name: source.name.clone(),
            target_namespace: target_namespace.clone(),
            qualified_elements: root.attribute("elementFormDefault") == Some("qualified"),
            qualified_attributes: root.attribute("attributeFormDefault") == Some("qualified"),
        });

        for child in xsd_children(root) {
            let table = match child.tag_name().name() {
                "element" => &mut self.elements,
                "attribute" => &mut self.attributes,
                "complexType" => &mut self.complex_types,
                "simpleType" => &mut self.simple_types,
                "group" => &mut self.groups,
                "attributeGroup" => &mut self.attribute_groups,
                _ => continue,
            };
            let name = child.attribute("name").ok_or_else(|| {
                Error::Xsd(format!(
                    "'{}': global <{}> without a name",
                    source.name,
                    child.tag_name().name()
                ))
            })?;
            let qname = QName {
                namespace: target_namespace.clone(),
                local_name: name.to_string(),
            };
            if table.insert(qname.clone(), Def { doc: index, node: child }).is_some() {
                return Err(Error::Xsd(format!(
                    "'{}': duplicate global <{}> '{}'",
                    source.name,
                    child.tag_name().name(),
                    name
                )));
            }
        }
        Ok(())
    }

    fn compile_all(mut self) -> Result<Compiled> {
        let mut compiled = Compiled {
            target_namespace: self.docs.first().and_then(|d| d.target_namespace.clone()),
            ..Compiled::default()
        };

        let simple_names: Vec<QName> = self.simple_types.keys().cloned().collect();
        for qname in simple_names {
            let simple = self.named_simple_type(&qname)?;
            compiled.simple_types.insert(qname, simple);
        }

        let complex_names: Vec<QName> = self.complex_types.keys().cloned().collect();
        for qname in complex_names {
            let complex = self.named_complex_type(&qname)?;
            compiled.complex_types.insert(qname, complex);
        }

        let element_defs: Vec<(QName, Def<'a, 'input>)> =
            self.elements.iter().map(|(k, v)| (k.clone(), *v)).collect();
        for (qname, def) in element_defs {
            let decl = self.element_decl(def.node, def.doc, true)?;
            compiled.elements.insert(qname, Arc::new(decl));
        }

        debug!(
            elements = compiled.elements.len(),
            complex_types = compiled.complex_types.len(),
            simple_types = compiled.simple_types.len(),
            "compiled schema"
        );
        Ok(compiled)
    }

    fn error(&self, doc: usize, message: impl std::fmt::Display) -> Error {
        Error::Xsd(format!("'{}': {}", self.docs[doc].name, message))
    }

    /// Resolve a QName-valued attribute in the scope of `node`
    fn resolve_qname(&self, node: Node<'a, 'input>, doc: usize, value: &str) -> Result<QName> {
        let (prefix, local) = split_prefixed(value.trim());
        let namespace = match prefix {
            Some("xml") => Some(XML_NAMESPACE.to_string()),
            Some(prefix) => Some(
                node.lookup_namespace_uri(Some(prefix))
                    .ok_or_else(|| self.error(doc, format!("undeclared prefix in '{}'", value)))?
                    .to_string(),
            ),
            None => node.lookup_namespace_uri(None).map(str::to_string),
        };
        Ok(QName {
            namespace,
            local_name: local.to_string(),
        })
    }

    // -------------------------------------------------------------------------
    // Simple types
    // -------------------------------------------------------------------------

    fn named_simple_type(&mut self, qname: &QName) -> Result<Arc<SimpleType>> {
        if qname.namespace.as_deref() == Some(XSD_NAMESPACE) {
            return Builtin::from_name(&qname.local_name)
                .map(SimpleType::builtin)
                .ok_or_else(|| Error::Xsd(format!("unknown built-in simple type '{}'", qname)));
        }
        if let Some(cached) = self.simple_cache.get(qname) {
            return Ok(cached.clone());
        }
        let def = *self
            .simple_types
            .get(qname)
            .ok_or_else(|| Error::Xsd(format!("unknown simple type '{}'", qname)))?;
        if !self.in_progress.insert(qname.clone()) {
            return Err(self.error(def.doc, format!("circular definition of simple type '{}'", qname)));
        }
        let simple = self.simple_type(def.node, def.doc, Some(qname.local_name.clone()));
        self.in_progress.remove(qname);
        let simple = Arc::new(simple?);
        self.simple_cache.insert(qname.clone(), simple.clone());
        Ok(simple)
    }

    /// Compile an `xs:simpleType` element
    fn simple_type(&mut self, node: Node<'a, 'input>, doc: usize, name: Option<String>) -> Result<SimpleType> {
        if let Some(restriction) = first_child(node, "restriction") {
            let base = self.restriction_base(restriction, doc)?;
            let facets = self.facets(restriction, doc)?;
            return Ok(SimpleType::Restriction { name, base, facets });
        }
        if let Some(list) = first_child(node, "list") {
            let item = match list.attribute("itemType") {
                Some(item) => {
                    let qname = self.resolve_qname(list, doc, item)?;
                    self.named_simple_type(&qname)?
                }
                None => self.inline_simple_type(list, doc)?,
            };
            return Ok(SimpleType::List { name, item });
        }
        if let Some(union) = first_child(node, "union") {
            let mut members = Vec::new();
            if let Some(member_types) = union.attribute("memberTypes") {
                for member in member_types.split_whitespace() {
                    let qname = self.resolve_qname(union, doc, member)?;
                    members.push(self.named_simple_type(&qname)?);
                }
            }
            for inline in xsd_children(union).filter(|c| c.tag_name().name() == "simpleType") {
                members.push(Arc::new(self.simple_type(inline, doc, None)?));
            }
            if members.is_empty() {
                return Err(self.error(doc, "union without member types"));
            }
            return Ok(SimpleType::Union { name, members });
        }
        Err(self.error(doc, "simpleType needs a restriction, list or union"))
    }

    fn inline_simple_type(&mut self, node: Node<'a, 'input>, doc: usize) -> Result<Arc<SimpleType>> {
        let inline = first_child(node, "simpleType")
            .ok_or_else(|| self.error(doc, format!("<{}> has no type", node.tag_name().name())))?;
        Ok(Arc::new(self.simple_type(inline, doc, None)?))
    }

    fn restriction_base(&mut self, restriction: Node<'a, 'input>, doc: usize) -> Result<Arc<SimpleType>> {
        match restriction.attribute("base") {
            Some(base) => {
                let qname = self.resolve_qname(restriction, doc, base)?;
                self.named_simple_type(&qname)
            }
            None => self.inline_simple_type(restriction, doc),
        }
    }

    fn facets(&self, restriction: Node<'a, 'input>, doc: usize) -> Result<Facets> {
        let mut facets = Facets::default();
        for facet in xsd_children(restriction) {
            let kind = facet.tag_name().name();
            if matches!(kind, "simpleType" | "attribute" | "attributeGroup" | "anyAttribute"
                | "sequence" | "choice" | "all" | "group") {
                continue;
            }
            let value = facet
                .attribute("value")
                .ok_or_else(|| self.error(doc, format!("<{}> facet without a value", kind)))?;
            let count = || {
                value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| self.error(doc, format!("invalid {} '{}'", kind, value)))
            };
            match kind {
                "length" => facets.length = Some(count()?),
                "minLength" => facets.min_length = Some(count()?),
                "maxLength" => facets.max_length = Some(count()?),
                "totalDigits" => facets.total_digits = Some(count()?),
                "fractionDigits" => facets.fraction_digits = Some(count()?),
                "pattern" => facets.patterns.push(Pattern::new(value)?),
                "enumeration" => facets.enumeration.push(value.to_string()),
                "minInclusive" => facets.min_inclusive = Some(value.trim().to_string()),
                "maxInclusive" => facets.max_inclusive = Some(value.trim().to_string()),
                "minExclusive" => facets.min_exclusive = Some(value.trim().to_string()),
                "maxExclusive" => facets.max_exclusive = Some(value.trim().to_string()),
                "whiteSpace" => facets.white_space = Some(WhiteSpace::parse(value)?),
                "assertion" | "explicitTimezone" => {}
                other => return Err(self.error(doc, format!("unknown facet <{}>", other))),
            }
        }
        Ok(facets)
    }

    // -------------------------------------------------------------------------
    // Complex types
    // -------------------------------------------------------------------------

    fn named_complex_type(&mut self, qname: &QName) -> Result<Arc<ComplexType>> {
        if let Some(cached) = self.complex_cache.get(qname) {
            return Ok(cached.clone());
        }
        let def = *self
            .complex_types
            .get(qname)
            .ok_or_else(|| Error::Xsd(format!("unknown complex type '{}'", qname)))?;
        if !self.in_progress.insert(qname.clone()) {
            return Err(self.error(def.doc, format!("circular derivation of complex type '{}'", qname)));
        }
        let complex = self.complex_type(def.node, def.doc, Some(qname.local_name.clone()));
        self.in_progress.remove(qname);
        let complex = Arc::new(complex?);
        self.complex_cache.insert(qname.clone(), complex.clone());
        Ok(complex)
    }

    /// Compile an `xs:complexType` element
    fn complex_type(&mut self, node: Node<'a, 'input>, doc: usize, name: Option<String>) -> Result<ComplexType> {
        let mixed = node.attribute("mixed") == Some("true");

        if let Some(simple_content) = first_child(node, "simpleContent") {
            return self.simple_content(simple_content, doc, name);
        }

        if let Some(complex_content) = first_child(node, "complexContent") {
            let mixed = match complex_content.attribute("mixed") {
                Some(value) => value == "true",
                None => mixed,
            };
            return self.complex_content(complex_content, doc, name, mixed);
        }

        let particle = self.content_particle(node, doc)?;
        let (attributes, any_attribute) = self.attribute_uses(node, doc, Vec::new())?;
        Ok(ComplexType {
            name,
            content: element_content(particle, mixed),
            attributes,
            any_attribute,
        })
    }

    fn simple_content(&mut self, node: Node<'a, 'input>, doc: usize, name: Option<String>) -> Result<ComplexType> {
        let (derivation, base) = self.derivation(node, doc)?;
        let is_extension = derivation.tag_name().name() == "extension";

        let (base_simple, base_attributes, base_wildcard) = if base.namespace.as_deref()
            == Some(XSD_NAMESPACE)
            || self.simple_types.contains_key(&base)
        {
            (self.named_simple_type(&base)?, Vec::new(), None)
        } else {
            let base_type = self.named_complex_type(&base)?;
            match &base_type.content {
                Content::Simple(simple) => (
                    simple.clone(),
                    base_type.attributes.clone(),
                    base_type.any_attribute.clone(),
                ),
                _ => {
                    return Err(self.error(
                        doc,
                        format!("simpleContent base '{}' has no simple content", base),
                    ))
                }
            }
        };

        let content = if is_extension {
            base_simple
        } else {
            let facets = self.facets(derivation, doc)?;
            let restricted_base = match first_child(derivation, "simpleType") {
                Some(inline) => Arc::new(self.simple_type(inline, doc, None)?),
                None => base_simple,
            };
            if facets.is_empty() {
                restricted_base
            } else {
                Arc::new(SimpleType::Restriction {
                    name: None,
                    base: restricted_base,
                    facets,
                })
            }
        };

        let (attributes, own_wildcard) = self.attribute_uses(derivation, doc, base_attributes)?;
        Ok(ComplexType {
            name,
            content: Content::Simple(content),
            attributes,
            any_attribute: own_wildcard.or(base_wildcard),
        })
    }

    fn complex_content(
        &mut self,
        node: Node<'a, 'input>,
        doc: usize,
        name: Option<String>,
        mixed: bool,
    ) -> Result<ComplexType> {
        let (derivation, base) = self.derivation(node, doc)?;
        let is_extension = derivation.tag_name().name() == "extension";
        let base_is_any = base.namespace.as_deref() == Some(XSD_NAMESPACE) && base.local_name == "anyType";

        let (base_particle, base_attributes, base_wildcard) = if base_is_any {
            (None, Vec::new(), None)
        } else {
            let base_type = self.named_complex_type(&base)?;
            let particle = match &base_type.content {
                Content::Elements { particle, .. } => Some(particle.clone()),
                Content::Empty => None,
                Content::Simple(_) => {
                    return Err(self.error(
                        doc,
                        format!("complexContent base '{}' has simple content", base),
                    ))
                }
            };
            (particle, base_type.attributes.clone(), base_type.any_attribute.clone())
        };

        let own_particle = self.content_particle(derivation, doc)?;
        let particle = if is_extension {
            match (base_particle, own_particle) {
                (Some(base), Some(own)) => Some(Particle::new(Term::Sequence(vec![base, own]), Occurs::ONCE)),
                (base, own) => base.or(own),
            }
        } else {
            own_particle
        };

        let (attributes, own_wildcard) = self.attribute_uses(derivation, doc, base_attributes)?;
        Ok(ComplexType {
            name,
            content: element_content(particle, mixed),
            attributes,
            any_attribute: own_wildcard.or(base_wildcard),
        })
    }

    fn derivation(&self, node: Node<'a, 'input>, doc: usize) -> Result<(Node<'a, 'input>, QName)> {
        let derivation = first_child(node, "extension")
            .or_else(|| first_child(node, "restriction"))
            .ok_or_else(|| self.error(doc, "content derivation needs an extension or restriction"))?;
        let base = derivation
            .attribute("base")
            .ok_or_else(|| self.error(doc, "derivation without a base"))?;
        let base = self.resolve_qname(derivation, doc, base)?;
        Ok((derivation, base))
    }

    // -------------------------------------------------------------------------
    // Particles
    // -------------------------------------------------------------------------

    /// The model group child of a complex type or derivation, if any
    fn content_particle(&mut self, node: Node<'a, 'input>, doc: usize) -> Result<Option<Particle>> {
        match xsd_children(node)
            .find(|c| matches!(c.tag_name().name(), "sequence" | "choice" | "all" | "group"))
        {
            Some(group) => self.particle(group, doc, 0).map(Some),
            None => Ok(None),
        }
    }

    fn particle(&mut self, node: Node<'a, 'input>, doc: usize, depth: usize) -> Result<Particle> {
        let occurs = self.occurs(node, doc)?;
        let term = match node.tag_name().name() {
            "element" => match node.attribute("ref") {
                Some(reference) => {
                    let qname = self.resolve_qname(node, doc, reference)?;
                    if !self.elements.contains_key(&qname) {
                        return Err(self.error(doc, format!("unknown element reference '{}'", qname)));
                    }
                    Term::ElementRef {
                        namespace: qname.namespace,
                        name: qname.local_name,
                    }
                }
                None => Term::Element(Arc::new(self.element_decl(node, doc, false)?)),
            },
            "sequence" | "choice" | "all" => {
                let mut items = Vec::new();
                for child in xsd_children(node) {
                    if matches!(
                        child.tag_name().name(),
                        "element" | "sequence" | "choice" | "group" | "any"
                    ) {
                        items.push(self.particle(child, doc, depth)?);
                    }
                }
                match node.tag_name().name() {
                    "sequence" => Term::Sequence(items),
                    "choice" => Term::Choice(items),
                    _ => Term::All(items),
                }
            }
            "group" => {
                if depth >= MAX_GROUP_DEPTH {
                    return Err(self.error(doc, "group references nest too deeply"));
                }
                let reference = node
                    .attribute("ref")
                    .ok_or_else(|| self.error(doc, "local <group> without a ref"))?;
                let qname = self.resolve_qname(node, doc, reference)?;
                let def = *self
                    .groups
                    .get(&qname)
                    .ok_or_else(|| self.error(doc, format!("unknown group '{}'", qname)))?;
                let model = xsd_children(def.node)
                    .find(|c| matches!(c.tag_name().name(), "sequence" | "choice" | "all"))
                    .ok_or_else(|| self.error(def.doc, format!("group '{}' has no model", qname)))?;
                let inner = self.particle(model, def.doc, depth + 1)?;
                // The reference carries the occurrence, the group's model occurs once
                inner.term
            }
            "any" => Term::Any(self.wildcard(node, doc)?),
            other => return Err(self.error(doc, format!("unexpected <{}> in content model", other))),
        };
        Ok(Particle::new(term, occurs))
    }

    fn occurs(&self, node: Node<'a, 'input>, doc: usize) -> Result<Occurs> {
        let min = match node.attribute("minOccurs") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| self.error(doc, format!("invalid minOccurs '{}'", value)))?,
            None => 1,
        };
        let max = match node.attribute("maxOccurs") {
            Some("unbounded") => None,
            Some(value) => Some(
                value
                    .trim()
                    .parse()
                    .map_err(|_| self.error(doc, format!("invalid maxOccurs '{}'", value)))?,
            ),
            None => Some(1),
        };
        if max.map_or(false, |max| max < min) {
            return Err(self.error(doc, "maxOccurs is smaller than minOccurs"));
        }
        Ok(Occurs::new(min, max))
    }

    fn wildcard(&self, node: Node<'a, 'input>, doc: usize) -> Result<Wildcard> {
        let target = self.docs[doc].target_namespace.clone();
        let namespaces = match node.attribute("namespace").map(str::trim) {
            None | Some("##any") => NamespaceConstraint::Any,
            Some("##other") => NamespaceConstraint::Other(target),
            Some(list) => NamespaceConstraint::List(
                list.split_whitespace()
                    .map(|token| match token {
                        "##targetNamespace" => target.clone(),
                        "##local" => None,
                        uri => Some(uri.to_string()),
                    })
                    .collect(),
            ),
        };
        let process_contents = match node.attribute("processContents") {
            None | Some("strict") => ProcessContents::Strict,
            Some("lax") => ProcessContents::Lax,
            Some("skip") => ProcessContents::Skip,
            Some(other) => return Err(self.error(doc, format!("invalid processContents '{}'", other))),
        };
        Ok(Wildcard {
            namespaces,
            process_contents,
        })
    }

    // -------------------------------------------------------------------------
    // Declarations
    // -------------------------------------------------------------------------

    fn element_decl(&mut self, node: Node<'a, 'input>, doc: usize, global: bool) -> Result<ElementDecl> {
        let name = node
            .attribute("name")
            .ok_or_else(|| self.error(doc, "element without a name or ref"))?;
        let qualified = match node.attribute("form") {
            Some(form) => form == "qualified",
            None => global || self.docs[doc].qualified_elements,
        };
        let namespace = if qualified {
            self.docs[doc].target_namespace.clone()
        } else {
            None
        };

        let type_ref = match node.attribute("type") {
            Some(type_name) => {
                let qname = self.resolve_qname(node, doc, type_name)?;
                self.type_ref(&qname, doc)?
            }
            None => {
                if let Some(complex) = first_child(node, "complexType") {
                    TypeRef::Complex(Arc::new(self.complex_type(complex, doc, None)?))
                } else if let Some(simple) = first_child(node, "simpleType") {
                    TypeRef::Simple(Arc::new(self.simple_type(simple, doc, None)?))
                } else {
                    TypeRef::Any
                }
            }
        };

        Ok(ElementDecl {
            name: name.to_string(),
            namespace,
            type_ref,
            nillable: node.attribute("nillable") == Some("true"),
            fixed: node.attribute("fixed").map(str::to_string),
        })
    }

    fn type_ref(&mut self, qname: &QName, doc: usize) -> Result<TypeRef> {
        if qname.namespace.as_deref() == Some(XSD_NAMESPACE) {
            if qname.local_name == "anyType" {
                return Ok(TypeRef::Any);
            }
            return self.named_simple_type(qname).map(TypeRef::Simple);
        }
        if self.simple_types.contains_key(qname) {
            return self.named_simple_type(qname).map(TypeRef::Simple);
        }
        if self.complex_types.contains_key(qname) {
            return Ok(TypeRef::Named(qname.clone()));
        }
        Err(self.error(doc, format!("unknown type '{}'", qname)))
    }

    /// Attribute uses of `node`, merged over `inherited`
    fn attribute_uses(
        &mut self,
        node: Node<'a, 'input>,
        doc: usize,
        inherited: Vec<AttributeDecl>,
    ) -> Result<(Vec<AttributeDecl>, Option<Wildcard>)> {
        let mut attributes = inherited;
        let mut wildcard = None;
        self.collect_attributes(node, doc, &mut attributes, &mut wildcard, 0)?;
        Ok((attributes, wildcard))
    }

    fn collect_attributes(
        &mut self,
        node: Node<'a, 'input>,
        doc: usize,
        attributes: &mut Vec<AttributeDecl>,
        wildcard: &mut Option<Wildcard>,
        depth: usize,
    ) -> Result<()> {
        for child in xsd_children(node) {
            match child.tag_name().name() {
                "attribute" => {
                    let decl = self.attribute_decl(child, doc)?;
                    match attributes
                        .iter_mut()
                        .find(|a| a.matches(decl.namespace.as_deref(), &decl.name))
                    {
                        Some(existing) => *existing = decl,
                        None => attributes.push(decl),
                    }
                }
                "attributeGroup" => {
                    if depth >= MAX_GROUP_DEPTH {
                        return Err(self.error(doc, "attribute group references nest too deeply"));
                    }
                    let reference = child
                        .attribute("ref")
                        .ok_or_else(|| self.error(doc, "local <attributeGroup> without a ref"))?;
                    let qname = self.resolve_qname(child, doc, reference)?;
                    let def = *self
                        .attribute_groups
                        .get(&qname)
                        .ok_or_else(|| self.error(doc, format!("unknown attribute group '{}'", qname)))?;
                    self.collect_attributes(def.node, def.doc, attributes, wildcard, depth + 1)?;
                }
                "anyAttribute" => *wildcard = Some(self.wildcard(child, doc)?),
                _ => {}
            }
        }
        Ok(())
    }

    fn attribute_decl(&mut self, node: Node<'a, 'input>, doc: usize) -> Result<AttributeDecl> {
        let usage = match node.attribute("use") {
            None | Some("optional") => AttributeUse::Optional,
            Some("required") => AttributeUse::Required,
            Some("prohibited") => AttributeUse::Prohibited,
            Some(other) => return Err(self.error(doc, format!("invalid attribute use '{}'", other))),
        };

        if let Some(reference) = node.attribute("ref") {
            let qname = self.resolve_qname(node, doc, reference)?;
            let mut decl = if qname.namespace.as_deref() == Some(XML_NAMESPACE) {
                xml_attribute(&qname.local_name)
                    .ok_or_else(|| self.error(doc, format!("unknown attribute '{}'", qname)))?
            } else {
                let def = *self
                    .attributes
                    .get(&qname)
                    .ok_or_else(|| self.error(doc, format!("unknown attribute '{}'", qname)))?;
                let mut global = self.attribute_body(def.node, def.doc, &qname.local_name)?;
                global.namespace = qname.namespace.clone();
                global
            };
            decl.usage = usage;
            if let Some(fixed) = node.attribute("fixed") {
                decl.fixed = Some(fixed.to_string());
            }
            return Ok(decl);
        }

        let name = node
            .attribute("name")
            .ok_or_else(|| self.error(doc, "attribute without a name or ref"))?;
        let mut decl = self.attribute_body(node, doc, name)?;
        let qualified = match node.attribute("form") {
            Some(form) => form == "qualified",
            None => self.docs[doc].qualified_attributes,
        };
        if qualified {
            decl.namespace = self.docs[doc].target_namespace.clone();
        }
        decl.usage = usage;
        Ok(decl)
    }

    fn attribute_body(&mut self, node: Node<'a, 'input>, doc: usize, name: &str) -> Result<AttributeDecl> {
        let simple_type = match node.attribute("type") {
            Some(type_name) => {
                let qname = self.resolve_qname(node, doc, type_name)?;
                self.named_simple_type(&qname)?
            }
            None => match first_child(node, "simpleType") {
                Some(inline) => Arc::new(self.simple_type(inline, doc, None)?),
                None => SimpleType::builtin(Builtin::AnySimpleType),
            },
        };
        Ok(AttributeDecl {
            name: name.to_string(),
            namespace: None,
            simple_type,
            usage: AttributeUse::Optional,
            fixed: node.attribute("fixed").map(str::to_string),
        })
    }
}

fn element_content(particle: Option<Particle>, mixed: bool) -> Content {
    match particle {
        Some(particle) => Content::Elements { particle, mixed },
        None if mixed => Content::Elements {
            particle: Particle::empty(),
            mixed,
        },
        None => Content::Empty,
    }
}

/// Attributes of the `xml` namespace, known without importing `xml.xsd`
fn xml_attribute(local_name: &str) -> Option<AttributeDecl> {
    let simple_type = match local_name {
        "lang" => Arc::new(SimpleType::Union {
            name: Some("xml:lang".to_string()),
            members: vec![
                SimpleType::builtin(Builtin::Language),
                Arc::new(SimpleType::Restriction {
                    name: None,
                    base: SimpleType::builtin(Builtin::String),
                    facets: Facets {
                        enumeration: vec![String::new()],
                        ..Facets::default()
                    },
                }),
            ],
        }),
        "space" => Arc::new(SimpleType::Restriction {
            name: Some("xml:space".to_string()),
            base: SimpleType::builtin(Builtin::NCName),
            facets: Facets {
                enumeration: vec!["default".to_string(), "preserve".to_string()],
                ..Facets::default()
            },
        }),
        "base" => SimpleType::builtin(Builtin::AnyUri),
        "id" => SimpleType::builtin(Builtin::Id),
        _ => return None,
    };
    Some(AttributeDecl {
        name: local_name.to_string(),
        namespace: Some(XML_NAMESPACE.to_string()),
        simple_type,
        usage: AttributeUse::Optional,
        fixed: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_text(xsd: &str) -> Result<Compiled> {
        let sources = collect_sources(xsd.to_string(), "test.xsd".to_string(), None)?;
        compile(&sources)
    }

    const TNS: &str = "urn:test";

    fn qname(local: &str) -> QName {
        QName::namespaced(TNS, local)
    }

    #[test]
    fn test_compile_named_types() {
        let compiled = compile_text(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns="urn:test"
                targetNamespace="urn:test" elementFormDefault="qualified">
                <xs:element name="root" type="TRoot"/>
                <xs:complexType name="TRoot">
                    <xs:sequence>
                        <xs:element name="item" type="TCode" maxOccurs="unbounded"/>
                    </xs:sequence>
                    <xs:attribute name="id" type="xs:int" use="required"/>
                </xs:complexType>
                <xs:simpleType name="TCode">
                    <xs:restriction base="xs:string"><xs:maxLength value="4"/></xs:restriction>
                </xs:simpleType>
            </xs:schema>"#,
        )
        .unwrap();

        assert_eq!(compiled.target_namespace.as_deref(), Some(TNS));
        let root = &compiled.elements[&qname("root")];
        assert!(matches!(&root.type_ref, TypeRef::Named(q) if *q == qname("TRoot")));

        let ty = &compiled.complex_types[&qname("TRoot")];
        assert_eq!(ty.attributes.len(), 1);
        assert_eq!(ty.attributes[0].usage, AttributeUse::Required);
        let Content::Elements { particle, mixed } = &ty.content else {
            panic!("expected element content");
        };
        assert!(!mixed);
        let Term::Sequence(items) = &particle.term else {
            panic!("expected a sequence");
        };
        assert_eq!(items[0].occurs, Occurs::new(1, None));
        let Term::Element(item) = &items[0].term else {
            panic!("expected an element");
        };
        assert_eq!(item.namespace.as_deref(), Some(TNS));
        assert!(compiled.simple_types.contains_key(&qname("TCode")));
    }

    #[test]
    fn test_extension_appends_content_and_attributes() {
        let compiled = compile_text(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:t="urn:test"
                targetNamespace="urn:test">
                <xs:complexType name="TBase">
                    <xs:sequence><xs:element name="a" type="xs:string"/></xs:sequence>
                    <xs:attribute name="x" type="xs:string"/>
                </xs:complexType>
                <xs:complexType name="TDerived">
                    <xs:complexContent>
                        <xs:extension base="t:TBase">
                            <xs:sequence><xs:element name="b" type="xs:string"/></xs:sequence>
                            <xs:attribute name="y" type="xs:string"/>
                        </xs:extension>
                    </xs:complexContent>
                </xs:complexType>
                <xs:complexType name="TText">
                    <xs:simpleContent>
                        <xs:extension base="xs:string">
                            <xs:attribute ref="xml:lang"/>
                        </xs:extension>
                    </xs:simpleContent>
                </xs:complexType>
            </xs:schema>"#,
        )
        .unwrap();

        let derived = &compiled.complex_types[&qname("TDerived")];
        assert_eq!(derived.attributes.len(), 2);
        let Content::Elements { particle, .. } = &derived.content else {
            panic!("expected element content");
        };
        assert!(matches!(&particle.term, Term::Sequence(items) if items.len() == 2));

        let text = &compiled.complex_types[&qname("TText")];
        assert!(matches!(text.content, Content::Simple(_)));
        assert!(text.attribute(Some(XML_NAMESPACE), "lang").is_some());
    }

    #[test]
    fn test_groups_are_inlined() {
        let compiled = compile_text(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:t="urn:test"
                targetNamespace="urn:test">
                <xs:group name="GStart">
                    <xs:choice><xs:element name="year" type="xs:gYear"/><xs:element name="date" type="xs:date"/></xs:choice>
                </xs:group>
                <xs:attributeGroup name="AGCommon">
                    <xs:attribute name="lang" type="xs:language"/>
                </xs:attributeGroup>
                <xs:complexType name="TPeriod">
                    <xs:sequence><xs:group ref="t:GStart" minOccurs="0"/></xs:sequence>
                    <xs:attributeGroup ref="t:AGCommon"/>
                </xs:complexType>
            </xs:schema>"#,
        )
        .unwrap();
        let period = &compiled.complex_types[&qname("TPeriod")];
        assert!(period.attribute(None, "lang").is_some());
        let Content::Elements { particle, .. } = &period.content else {
            panic!("expected element content");
        };
        let Term::Sequence(items) = &particle.term else {
            panic!("expected a sequence");
        };
        assert!(matches!(items[0].term, Term::Choice(_)));
        assert_eq!(items[0].occurs, Occurs::new(0, Some(1)));
    }

    #[test]
    fn test_schema_errors() {
        assert!(matches!(compile_text("<schema/>"), Err(Error::Xsd(_))));
        assert!(matches!(compile_text("<<<"), Err(Error::Xsd(_))));
        let unknown_type = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="a" type="xs:nonsense"/></xs:schema>"#;
        assert!(matches!(compile_text(unknown_type), Err(Error::Xsd(_))));
        let include = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:include schemaLocation="other.xsd"/></xs:schema>"#;
        let err = compile_text(include).unwrap_err();
        assert!(err.to_string().contains("other.xsd"));
    }

    #[test]
    fn test_include_resolved_against_base_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("types.xsd"),
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:simpleType name="TIndex"><xs:restriction base="xs:int"/></xs:simpleType>
            </xs:schema>"#,
        )
        .unwrap();
        let main = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" xmlns:t="urn:test"
            targetNamespace="urn:test">
            <xs:include schemaLocation="types.xsd"/>
            <xs:element name="index" type="t:TIndex"/>
        </xs:schema>"#;
        let sources = collect_sources(main.to_string(), "main.xsd".to_string(), Some(dir.path())).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[1].chameleon_namespace.as_deref(), Some(TNS));
        let compiled = compile(&sources).unwrap();
        assert!(compiled.simple_types.contains_key(&qname("TIndex")));
    }
}

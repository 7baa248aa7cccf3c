//! Dataset tree
//!
//! An arena of XML element nodes addressed by [`NodeId`]. The [`Document`]
//! owns every node; data objects are views that hold a `NodeId` and borrow
//! the document, so a mutation made through any view is visible through all
//! others. Nodes removed from the tree are unlinked but never reused, which
//! keeps stale ids from silently pointing at unrelated elements.

use std::io::Write;

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use crate::namespaces::{split_prefixed, NamespaceScopes, QName, XML_NAMESPACE};

/// Stable handle to a node in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// XML element in the dataset tree
#[derive(Debug, Clone)]
pub struct Node {
    /// Tag as written, including any prefix (`es:dataset`)
    pub tag: String,
    /// Resolved element name
    pub qname: QName,
    /// Attributes in document order, keyed by their written name
    pub attributes: IndexMap<String, String>,
    /// Namespace declarations on this element (`""` is the default namespace)
    pub namespace_decls: Vec<(String, String)>,
    /// Character content before the first child, if any
    pub text: Option<String>,
    /// Character content following this element inside its parent
    pub tail: Option<String>,
    /// Child elements in document order
    pub children: Vec<NodeId>,
    /// Parent element, `None` for the root and for removed nodes
    pub parent: Option<NodeId>,
}

impl Node {
    fn new(tag: String, qname: QName) -> Self {
        Self {
            tag,
            qname,
            attributes: IndexMap::new(),
            namespace_decls: Vec::new(),
            text: None,
            tail: None,
            children: Vec::new(),
            parent: None,
        }
    }

    /// Local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Prefix used in the written tag, if any
    pub fn prefix(&self) -> Option<&str> {
        split_prefixed(&self.tag).0
    }
}

/// XML document held as an arena of nodes
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create a document holding only a root element in `namespace`
    pub fn with_root(namespace: &str, local_name: &str) -> Self {
        let mut root = Node::new(
            local_name.to_string(),
            QName::namespaced(namespace, local_name),
        );
        root.namespace_decls
            .push((String::new(), namespace.to_string()));
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    /// Parse an XML document from a string
    pub fn from_str(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes(), &Limits::default())
    }

    /// Parse an XML document from bytes
    pub fn parse(xml: &[u8], limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;

        let mut reader = Reader::from_reader(xml);

        let mut nodes: Vec<Node> = Vec::new();
        let mut root: Option<NodeId> = None;
        let mut stack: Vec<NodeId> = Vec::new();
        let mut scopes = NamespaceScopes::new();
        let mut buf = Vec::new();

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                ParseError::new(e.to_string()).with_position(reader.buffer_position())
            })?;

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    if stack.is_empty() && root.is_some() {
                        return Err(ParseError::new("document has more than one root element")
                            .with_position(reader.buffer_position())
                            .into());
                    }
                    limits.check_xml_depth(stack.len() + 1)?;

                    let mut node = Self::parse_element(e, &mut scopes, limits)?;
                    let id = NodeId(nodes.len());
                    node.parent = stack.last().copied();
                    nodes.push(node);

                    match stack.last() {
                        Some(parent) => nodes[parent.0].children.push(id),
                        None => root = Some(id),
                    }

                    if is_empty {
                        scopes.pop();
                    } else {
                        stack.push(id);
                    }
                }
                Event::End(_) => {
                    stack.pop();
                    scopes.pop();
                }
                Event::Text(e) => {
                    if let Some(current) = stack.last() {
                        let text = e.unescape().map_err(|err| {
                            ParseError::new(format!("failed to unescape text: {}", err))
                                .with_position(reader.buffer_position())
                        })?;
                        // Whitespace-only runs are layout; anything else is kept verbatim
                        if !text.trim().is_empty() {
                            push_character_data(&mut nodes, *current, &text);
                        }
                    }
                }
                Event::CData(e) => {
                    if let Some(current) = stack.last() {
                        let bytes = e.into_inner();
                        let text = std::str::from_utf8(&bytes).map_err(|err| {
                            ParseError::new(format!("CDATA is not valid UTF-8: {}", err))
                                .with_position(reader.buffer_position())
                        })?;
                        push_character_data(&mut nodes, *current, text);
                    }
                }
                Event::Eof => break,
                _ => {} // Declarations, comments and processing instructions are not kept
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(ParseError::new("unexpected end of document: unclosed elements")
                .with_position(reader.buffer_position())
                .into());
        }

        match root {
            Some(root) => Ok(Self { nodes, root }),
            None => Err(ParseError::new("document has no root element").into()),
        }
    }

    /// Build a node from a start tag, pushing its namespace scope
    fn parse_element(
        start: &BytesStart,
        scopes: &mut NamespaceScopes,
        limits: &Limits,
    ) -> Result<Node> {
        let tag = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| ParseError::new(format!("invalid element name: {}", e)))?
            .to_string();

        let mut declarations = Vec::new();
        let mut attributes = IndexMap::new();

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| ParseError::new(format!("failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| ParseError::new(format!("invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| ParseError::new(format!("failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                declarations.push((String::new(), attr_value));
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                declarations.push((prefix.to_string(), attr_value));
            } else if attributes.insert(attr_name.clone(), attr_value).is_some() {
                return Err(
                    ParseError::new(format!("duplicate attribute '{}' on <{}>", attr_name, tag))
                        .into(),
                );
            }
        }
        limits.check_attributes(attributes.len())?;

        scopes.push(declarations.clone());
        let qname = scopes.resolve_element(&tag)?;
        for name in attributes.keys() {
            scopes.resolve_attribute(name)?;
        }

        let mut node = Node::new(tag, qname);
        node.attributes = attributes;
        node.namespace_decls = declarations;
        Ok(node)
    }

    /// The root element
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Access a node
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Access a node mutably
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Child elements of `id`, in document order
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Parent of `id`
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// True if `id` is still reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Get an attribute value by its written name
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attributes.get(name).map(|s| s.as_str())
    }

    /// Set (or replace in place) an attribute value
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: String) {
        self.nodes[id.0].attributes.insert(name.to_string(), value);
    }

    /// Remove an attribute, returning its old value
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.nodes[id.0].attributes.shift_remove(name)
    }

    /// Namespace URI bound to `prefix` in the scope of `id`
    pub fn lookup_namespace(&self, id: NodeId, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.0];
            if let Some((_, uri)) = node.namespace_decls.iter().find(|(p, _)| p == prefix) {
                return Some(uri.as_str()).filter(|uri| !uri.is_empty());
            }
            current = node.parent;
        }
        None
    }

    /// Text content of `id`
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].text.as_deref()
    }

    /// Replace the text content of `id`
    pub fn set_text(&mut self, id: NodeId, text: Option<String>) {
        self.nodes[id.0].text = text;
    }

    /// Children of `id` with the given local name in the parent's namespace
    pub fn find_children(&self, id: NodeId, local_name: &str) -> Vec<NodeId> {
        let namespace = self.nodes[id.0].namespace();
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(|c| self.nodes[c.0].qname.matches(namespace, local_name))
            .collect()
    }

    /// First child of `id` with the given local name
    pub fn find_child(&self, id: NodeId, local_name: &str) -> Option<NodeId> {
        let namespace = self.nodes[id.0].namespace();
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].qname.matches(namespace, local_name))
    }

    /// Create a detached element in the same namespace (and with the same
    /// prefix) as `parent`
    pub fn create_element(&mut self, parent: NodeId, local_name: &str) -> NodeId {
        let parent_node = &self.nodes[parent.0];
        let tag = match parent_node.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local_name),
            None => local_name.to_string(),
        };
        let qname = QName {
            namespace: parent_node.qname.namespace.clone(),
            local_name: local_name.to_string(),
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(tag, qname));
        id
    }

    /// Attach `child` to `parent` at `index` (clamped to the child count)
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Attach `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// Unlink `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let children = &mut self.nodes[parent.0].children;
        match children.iter().position(|c| *c == child) {
            Some(pos) => {
                children.remove(pos);
                self.nodes[child.0].parent = None;
                true
            }
            None => false,
        }
    }

    /// All attached elements below and including `id`, in document order
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev().copied());
        }
        out
    }

    /// Location path of `id`, e.g. `/ecoSpold/dataset[2]/flowData`
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.0];
            let segment = match node.parent {
                Some(parent) => {
                    let siblings = self.find_children(parent, node.local_name());
                    if siblings.len() > 1 {
                        let pos = siblings.iter().position(|s| *s == node_id).unwrap_or(0);
                        format!("{}[{}]", node.local_name(), pos + 1)
                    } else {
                        node.local_name().to_string()
                    }
                }
                None => node.local_name().to_string(),
            };
            segments.push(segment);
            current = node.parent;
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }

    /// Serialize the document, with an XML declaration, as UTF-8 bytes
    pub fn to_bytes(&self, pretty: bool) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out, pretty)?;
        Ok(out)
    }

    /// Serialize the document into `sink`
    pub fn write_to<W: Write>(&self, sink: W, pretty: bool) -> Result<()> {
        let mut writer = if pretty {
            Writer::new_with_indent(sink, b' ', 2)
        } else {
            Writer::new(sink)
        };
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        self.write_node(&mut writer, self.root)?;
        if pretty {
            writer.get_mut().write_all(b"\n")?;
        }
        Ok(())
    }

    fn write_node<W: Write>(&self, writer: &mut Writer<W>, id: NodeId) -> Result<()> {
        let node = &self.nodes[id.0];
        let mut start = BytesStart::new(node.tag.as_str());
        for (prefix, uri) in &node.namespace_decls {
            let key = if prefix.is_empty() {
                "xmlns".to_string()
            } else {
                format!("xmlns:{}", prefix)
            };
            start.push_attribute((key.as_str(), uri.as_str()));
        }
        for (name, value) in &node.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        let text = node.text.as_deref().filter(|t| !t.is_empty());
        if node.children.is_empty() && text.is_none() {
            return writer.write_event(Event::Empty(start)).map_err(write_error);
        }

        writer.write_event(Event::Start(start)).map_err(write_error)?;
        if let Some(text) = text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?;
        }
        for child in &node.children {
            self.write_node(writer, *child)?;
            if let Some(tail) = self.nodes[child.0].tail.as_deref().filter(|t| !t.is_empty()) {
                writer
                    .write_event(Event::Text(BytesText::new(tail)))
                    .map_err(write_error)?;
            }
        }
        writer
            .write_event(Event::End(BytesEnd::new(node.tag.as_str())))
            .map_err(write_error)
    }
}

/// Append character data to `parent`: to its text before the first child,
/// otherwise to the tail of its last child
fn push_character_data(nodes: &mut [Node], parent: NodeId, text: &str) {
    let slot = match nodes[parent.0].children.last().copied() {
        Some(last) => &mut nodes[last.0].tail,
        None => &mut nodes[parent.0].text,
    };
    match slot {
        Some(existing) => existing.push_str(text),
        None => *slot = Some(text.to_string()),
    }
}

fn write_error(e: quick_xml::Error) -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let doc = Document::from_str(xml).unwrap();

        let root = doc.root();
        assert_eq!(doc.node(root).local_name(), "root");
        assert_eq!(doc.children(root).len(), 1);
        let child = doc.children(root)[0];
        assert_eq!(doc.node(child).local_name(), "child");
        assert_eq!(doc.text(child), Some("text"));
    }

    #[test]
    fn test_parse_with_attributes_and_namespaces() {
        let xml = r#"<es:root xmlns:es="urn:test" b="2" a="1"><es:child/></es:root>"#;
        let doc = Document::from_str(xml).unwrap();

        let root = doc.root();
        assert!(doc.node(root).qname.matches(Some("urn:test"), "root"));
        let names: Vec<_> = doc.node(root).attributes.keys().cloned().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(doc.find_children(root, "child").len(), 1);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Document::from_str("<root><child></root>"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(Document::from_str("<root>"), Err(Error::Parse(_))));
        assert!(matches!(Document::from_str(""), Err(Error::Parse(_))));
        assert!(matches!(
            Document::from_str("<a/><b/>"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_depth_limit() {
        let limits = Limits {
            max_xml_depth: 2,
            ..Limits::default()
        };
        let result = Document::parse(b"<a><b><c/></b></a>", &limits);
        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_insert_and_remove_children() {
        let mut doc = Document::with_root("urn:test", "root");
        let root = doc.root();
        let b = doc.create_element(root, "b");
        doc.append_child(root, b);
        let a = doc.create_element(root, "a");
        doc.insert_child(root, 0, a);

        let names: Vec<_> = doc
            .children(root)
            .iter()
            .map(|c| doc.node(*c).local_name().to_string())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(doc.node(a).qname.matches(Some("urn:test"), "a"));

        assert!(doc.remove_child(root, a));
        assert!(!doc.is_attached(a));
        assert!(doc.is_attached(b));
    }

    #[test]
    fn test_path() {
        let doc = Document::from_str("<r><x/><x><y/></x></r>").unwrap();
        let second = doc.find_children(doc.root(), "x")[1];
        let y = doc.find_child(second, "y").unwrap();
        assert_eq!(doc.path(y), "/r/x[2]/y");
    }

    #[test]
    fn test_serialize_round_trip() {
        let xml = r#"<root xmlns="urn:test" a="1 &amp; 2"><child>x &lt; y</child><empty/></root>"#;
        let doc = Document::from_str(xml).unwrap();
        let bytes = doc.to_bytes(false).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(text.contains(r#"<root xmlns="urn:test" a="1 &amp; 2">"#));
        assert!(text.contains("<child>x &lt; y</child>"));
        assert!(text.contains("<empty/>"));

        let reparsed = Document::parse(text.as_bytes(), &Limits::default()).unwrap();
        let child = reparsed.find_child(reparsed.root(), "child").unwrap();
        assert_eq!(reparsed.text(child), Some("x < y"));
    }

    #[test]
    fn test_character_data_keeps_surrounding_whitespace() {
        let xml = "<r>\n  <name>  padded  </name>\n  <blank>   </blank>\n</r>";
        let doc = Document::from_str(xml).unwrap();
        let root = doc.root();
        assert_eq!(doc.text(root), None);
        let name = doc.find_child(root, "name").unwrap();
        assert_eq!(doc.text(name), Some("  padded  "));
        let blank = doc.find_child(root, "blank").unwrap();
        assert_eq!(doc.text(blank), None);

        let text = String::from_utf8(doc.to_bytes(false).unwrap()).unwrap();
        assert!(text.contains("<name>  padded  </name>"), "{}", text);
    }

    #[test]
    fn test_mixed_content_keeps_text_positions() {
        let doc = Document::from_str("<p>Heat <b>and</b> power <i>mix</i>.</p>").unwrap();
        let root = doc.root();
        assert_eq!(doc.text(root), Some("Heat "));
        let b = doc.find_child(root, "b").unwrap();
        assert_eq!(doc.node(b).tail.as_deref(), Some(" power "));
        let i = doc.find_child(root, "i").unwrap();
        assert_eq!(doc.node(i).tail.as_deref(), Some("."));

        let text = String::from_utf8(doc.to_bytes(false).unwrap()).unwrap();
        assert!(text.ends_with("<p>Heat <b>and</b> power <i>mix</i>.</p>"), "{}", text);
    }

    #[test]
    fn test_lookup_namespace_walks_ancestors() {
        let doc = Document::from_str(
            r#"<r xmlns:a="urn:a"><s xmlns:b="urn:b"><t/></s></r>"#,
        )
        .unwrap();
        let s = doc.find_child(doc.root(), "s").unwrap();
        let t = doc.find_child(s, "t").unwrap();
        assert_eq!(doc.lookup_namespace(t, "a"), Some("urn:a"));
        assert_eq!(doc.lookup_namespace(t, "b"), Some("urn:b"));
        assert_eq!(doc.lookup_namespace(doc.root(), "b"), None);
        assert_eq!(doc.lookup_namespace(t, "xml"), Some(XML_NAMESPACE));
    }
}

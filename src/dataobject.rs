//! Datasets and data object views
//!
//! A [`Dataset`] owns the document tree of one EcoSpold file together with its
//! generation and the shared [`Context`]. [`DataObject`] and [`DataObjectMut`]
//! are short-lived views of one element: a node handle plus the element type
//! that describes it. Views never own nodes; every change made through a
//! `DataObjectMut` lands in the dataset's tree and is visible to every view
//! created afterwards. Child views are built only when a field is accessed.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use ecospold::{Context, Dataset, Generation};
//! # fn main() -> ecospold::Result<()> {
//! let context = Arc::new(Context::embedded()?);
//! let mut dataset = Dataset::new(context, Generation::V1)?;
//! let mut root = dataset.root_mut();
//! let mut ds = root.append("dataset")?;
//! ds.set("number", 1)?;
//! assert_eq!(ds.as_ref().get_i64("number")?, Some(1));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use crate::binder;
use crate::coercion::{decode, SemanticType, Value};
use crate::context::Context;
use crate::documents::{Document, NodeId};
use crate::error::{Error, Result};
use crate::schema::{ElementType, FieldDescriptor, Generation, Schema};
use crate::validation::{self, ConformanceIssue};

// =============================================================================
// Dataset
// =============================================================================

/// One EcoSpold document bound to its schema
#[derive(Debug, Clone)]
pub struct Dataset {
    document: Document,
    generation: Generation,
    root_type: &'static ElementType,
    context: Arc<Context>,
    issues: Vec<ConformanceIssue>,
}

impl Dataset {
    /// Create an empty dataset holding only the root element
    pub fn new(context: Arc<Context>, generation: Generation) -> Result<Self> {
        let schema = generation.schema();
        let document = Document::with_root(schema.namespace, schema.root_tag);
        Self::from_document(context, generation, document)
    }

    /// Bind an already parsed document
    ///
    /// The document is not checked; see [`Dataset::validate`].
    pub fn from_document(
        context: Arc<Context>,
        generation: Generation,
        document: Document,
    ) -> Result<Self> {
        Ok(Self {
            document,
            generation,
            root_type: generation.schema().root()?,
            context,
            issues: Vec::new(),
        })
    }

    /// The document tree
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Schema generation
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Compiled schema of the generation
    pub fn schema(&self) -> &'static Schema {
        self.generation.schema()
    }

    /// Shared context
    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// Conformance issues recorded when the dataset was loaded
    pub fn issues(&self) -> &[ConformanceIssue] {
        &self.issues
    }

    pub(crate) fn set_issues(&mut self, issues: Vec<ConformanceIssue>) {
        self.issues = issues;
    }

    /// True if no conformance issues were recorded at load time
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Check the current tree against the schema
    pub fn validate(&self) -> Vec<ConformanceIssue> {
        validation::validate(
            &self.document,
            self.schema(),
            Some(self.context.xsd_schema(self.generation)),
        )
    }

    /// Write registry defaults into every absent field
    pub fn fill_defaults(&mut self) -> Result<usize> {
        crate::defaults::fill_in(self)
    }

    /// View of the root element
    pub fn root(&self) -> DataObject<'_> {
        DataObject::new(self, self.document.root(), self.root_type)
    }

    /// Mutable view of the root element
    pub fn root_mut(&mut self) -> DataObjectMut<'_> {
        let root = self.document.root();
        let ty = self.root_type;
        DataObjectMut::new(self, root, ty)
    }

    /// Re-acquire a view of `node`
    pub fn object(&self, node: NodeId) -> Result<DataObject<'_>> {
        let ty = self.element_type_of(node)?;
        Ok(DataObject::new(self, node, ty))
    }

    /// Re-acquire a mutable view of `node`
    pub fn object_mut(&mut self, node: NodeId) -> Result<DataObjectMut<'_>> {
        let ty = self.element_type_of(node)?;
        Ok(DataObjectMut::new(self, node, ty))
    }

    /// Element type bound to `node`, found by walking down from the root
    pub fn element_type_of(&self, node: NodeId) -> Result<&'static ElementType> {
        if !self.document.is_attached(node) {
            return Err(Error::Detached(self.document.path(node)));
        }

        let mut chain = vec![node];
        let mut current = node;
        while let Some(parent) = self.document.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain.pop();

        let mut ty = self.root_type;
        for id in chain.into_iter().rev() {
            let tag = self.document.node(id).local_name();
            let field = ty.require_field(tag)?;
            ty = match self.schema().child_type(field)? {
                Some(child_ty) => child_ty,
                None => {
                    return Err(Error::FieldKind {
                        element_type: ty.name.to_string(),
                        field: field.name.to_string(),
                        expected: "an element field",
                        actual: field.kind(),
                    })
                }
            };
        }
        Ok(ty)
    }
}

// =============================================================================
// Read view
// =============================================================================

/// Read-only view of one element
#[derive(Debug, Clone, Copy)]
pub struct DataObject<'a> {
    dataset: &'a Dataset,
    node: NodeId,
    ty: &'static ElementType,
}

impl<'a> DataObject<'a> {
    pub(crate) fn new(dataset: &'a Dataset, node: NodeId, ty: &'static ElementType) -> Self {
        Self { dataset, node, ty }
    }

    /// Element type describing this element
    pub fn element_type(&self) -> &'static ElementType {
        self.ty
    }

    /// Handle of the underlying node
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Local tag name
    pub fn tag(&self) -> &'a str {
        self.dataset.document.node(self.node).local_name()
    }

    /// Location path of the element
    pub fn path(&self) -> String {
        self.dataset.document.path(self.node)
    }

    /// The dataset this view belongs to
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Declared fields, in schema order
    pub fn fields(&self) -> &'static [FieldDescriptor] {
        self.ty.fields
    }

    /// View of the parent element
    pub fn parent(&self) -> Option<DataObject<'a>> {
        let parent = self.dataset.document.parent(self.node)?;
        self.dataset.object(parent).ok()
    }

    fn field(&self, name: &str) -> Result<&'static FieldDescriptor> {
        self.ty.require_field(name)
    }

    /// Read a single-valued scalar field (with default fallback)
    pub fn get(&self, field: &str) -> Result<Option<Value>> {
        let field = self.field(field)?;
        binder::read(
            &self.dataset.document,
            self.node,
            self.ty,
            field,
            self.dataset.context.registry(),
        )
    }

    fn typed<T>(
        &self,
        field: &str,
        expected: &'static str,
        extract: impl Fn(&Value) -> Option<T>,
    ) -> Result<Option<T>> {
        match self.get(field)? {
            None => Ok(None),
            Some(value) => extract(&value).map(Some).ok_or_else(|| Error::FieldKind {
                element_type: self.ty.name.to_string(),
                field: field.to_string(),
                expected,
                actual: value.kind(),
            }),
        }
    }

    /// Read a string field
    pub fn get_str(&self, field: &str) -> Result<Option<String>> {
        self.typed(field, "string", |v| v.as_str().map(str::to_string))
    }

    /// Read an integer, code or numeric reference field
    pub fn get_i64(&self, field: &str) -> Result<Option<i64>> {
        self.typed(field, "integer", Value::as_i64)
    }

    /// Read a float field
    pub fn get_f64(&self, field: &str) -> Result<Option<f64>> {
        self.typed(field, "float", Value::as_f64)
    }

    /// Read a boolean field
    pub fn get_bool(&self, field: &str) -> Result<Option<bool>> {
        self.typed(field, "boolean", Value::as_bool)
    }

    /// Read a date field
    pub fn get_date(&self, field: &str) -> Result<Option<NaiveDate>> {
        self.typed(field, "date", Value::as_date)
    }

    /// Read a timestamp field
    pub fn get_datetime(&self, field: &str) -> Result<Option<NaiveDateTime>> {
        self.typed(field, "dateTime", Value::as_datetime)
    }

    /// Read every value of a repeated text field
    pub fn get_list(&self, field: &str) -> Result<Vec<Value>> {
        let field = self.field(field)?;
        binder::read_list(&self.dataset.document, self.node, self.ty, field)
    }

    /// Description of a code field's current value
    pub fn get_label(&self, field: &str) -> Result<Option<&'static str>> {
        let descriptor = self.field(field)?;
        let table = match descriptor.semantic_type() {
            Some(SemanticType::Code(table)) => *table,
            _ => {
                return Err(Error::FieldKind {
                    element_type: self.ty.name.to_string(),
                    field: field.to_string(),
                    expected: "a code field",
                    actual: descriptor.kind(),
                })
            }
        };
        Ok(self.get_i64(field)?.and_then(|code| table.label(code)))
    }

    /// True if the field has a value (or child element) in the tree
    pub fn is_present(&self, field: &str) -> Result<bool> {
        let field = self.field(field)?;
        Ok(binder::is_present(&self.dataset.document, self.node, field))
    }

    /// View of the first child element of `field`
    pub fn child(&self, field: &str) -> Result<Option<DataObject<'a>>> {
        let descriptor = self.field(field)?;
        let node = binder::child(&self.dataset.document, self.node, self.ty, descriptor)?;
        match (node, self.dataset.schema().child_type(descriptor)?) {
            (Some(node), Some(ty)) => Ok(Some(DataObject::new(self.dataset, node, ty))),
            _ => Ok(None),
        }
    }

    /// Views of every child element of `field`, in document order
    pub fn children(&self, field: &str) -> Result<Vec<DataObject<'a>>> {
        let descriptor = self.field(field)?;
        let nodes = binder::children(&self.dataset.document, self.node, self.ty, descriptor)?;
        let Some(ty) = self.dataset.schema().child_type(descriptor)? else {
            return Ok(Vec::new());
        };
        Ok(nodes
            .into_iter()
            .map(|node| DataObject::new(self.dataset, node, ty))
            .collect())
    }

    /// Member of a choice group present on this element
    pub fn active_choice(&self, group: &str) -> Result<Option<&'static str>> {
        binder::active_choice(&self.dataset.document, self.node, self.ty, group)
    }
}

// =============================================================================
// Write view
// =============================================================================

/// Mutable view of one element
#[derive(Debug)]
pub struct DataObjectMut<'a> {
    dataset: &'a mut Dataset,
    node: NodeId,
    ty: &'static ElementType,
}

impl<'a> DataObjectMut<'a> {
    fn new(dataset: &'a mut Dataset, node: NodeId, ty: &'static ElementType) -> Self {
        Self { dataset, node, ty }
    }

    /// Element type describing this element
    pub fn element_type(&self) -> &'static ElementType {
        self.ty
    }

    /// Handle of the underlying node
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Read-only view of the same element
    pub fn as_ref(&self) -> DataObject<'_> {
        DataObject::new(self.dataset, self.node, self.ty)
    }

    /// Read a single-valued scalar field
    pub fn get(&self, field: &str) -> Result<Option<Value>> {
        self.as_ref().get(field)
    }

    fn field(&self, name: &str) -> Result<&'static FieldDescriptor> {
        self.ty.require_field(name)
    }

    /// Write a scalar field
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        let field = self.field(field)?;
        binder::write(
            &mut self.dataset.document,
            self.node,
            self.ty,
            field,
            &value.into(),
        )
    }

    /// Decode `raw` under the field's type and write it; empty text unsets
    pub fn set_raw(&mut self, field: &str, raw: &str) -> Result<()> {
        let descriptor = self.field(field)?;
        match decode(raw, descriptor)? {
            Some(value) => self.set(field, value),
            None => self.unset(field),
        }
    }

    /// Replace every value of a repeated text field
    pub fn set_list<I, V>(&mut self, field: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let field = self.field(field)?;
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        binder::write_list(&mut self.dataset.document, self.node, self.ty, field, &values)
    }

    /// Remove a field's attribute or child elements
    pub fn unset(&mut self, field: &str) -> Result<()> {
        let field = self.field(field)?;
        binder::remove(&mut self.dataset.document, self.node, field);
        Ok(())
    }

    fn child_type(&self, field: &'static FieldDescriptor) -> Result<&'static ElementType> {
        match self.dataset.schema().child_type(field)? {
            Some(ty) => Ok(ty),
            None => Err(Error::FieldKind {
                element_type: self.ty.name.to_string(),
                field: field.name.to_string(),
                expected: "an element field",
                actual: field.kind(),
            }),
        }
    }

    /// Mutable view of the first child element of `field`
    pub fn child_mut(&mut self, field: &str) -> Result<Option<DataObjectMut<'_>>> {
        self.child_at_mut(field, 0)
    }

    /// Mutable view of the `index`-th child element of `field`
    pub fn child_at_mut(&mut self, field: &str, index: usize) -> Result<Option<DataObjectMut<'_>>> {
        let descriptor = self.field(field)?;
        let ty = self.child_type(descriptor)?;
        let nodes = binder::children(&self.dataset.document, self.node, self.ty, descriptor)?;
        Ok(nodes
            .get(index)
            .map(|node| DataObjectMut::new(&mut *self.dataset, *node, ty)))
    }

    /// Mutable view of the child element of `field`, created if absent
    pub fn ensure_child(&mut self, field: &str) -> Result<DataObjectMut<'_>> {
        let descriptor = self.field(field)?;
        let ty = self.child_type(descriptor)?;
        let node = binder::ensure_child(&mut self.dataset.document, self.node, self.ty, descriptor)?;
        Ok(DataObjectMut::new(&mut *self.dataset, node, ty))
    }

    /// Create a new child element for `field` and return a view of it
    pub fn append(&mut self, field: &str) -> Result<DataObjectMut<'_>> {
        let descriptor = self.field(field)?;
        let ty = self.child_type(descriptor)?;
        let node = binder::append_child(&mut self.dataset.document, self.node, self.ty, descriptor)?;
        Ok(DataObjectMut::new(&mut *self.dataset, node, ty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dataset(generation: Generation) -> Dataset {
        Dataset::new(Arc::new(Context::embedded().unwrap()), generation).unwrap()
    }

    #[test]
    fn test_unknown_field_on_read_and_write() {
        let mut ds = dataset(Generation::V1);
        assert!(matches!(
            ds.root().get("colour"),
            Err(Error::UnknownField { .. })
        ));

        let before = ds.document().to_bytes(false).unwrap();
        assert!(matches!(
            ds.root_mut().set("colour", "red"),
            Err(Error::UnknownField { .. })
        ));
        assert_eq!(ds.document().to_bytes(false).unwrap(), before);
    }

    #[test]
    fn test_nested_views_share_the_tree() {
        let mut ds = dataset(Generation::V1);
        let exchange_id = {
            let mut root = ds.root_mut();
            let mut dataset = root.append("dataset").unwrap();
            let mut flow = dataset.ensure_child("flowData").unwrap();
            let mut exchange = flow.append("exchange").unwrap();
            exchange.set("meanValue", 2.5).unwrap();
            exchange.node_id()
        };

        let exchange = ds.object(exchange_id).unwrap();
        assert_eq!(exchange.element_type().name, "Exchange");
        assert_eq!(exchange.get_f64("meanValue").unwrap(), Some(2.5));
        assert_eq!(exchange.path(), "/ecoSpold/dataset/flowData/exchange");
        assert_eq!(exchange.parent().unwrap().tag(), "flowData");

        ds.object_mut(exchange_id)
            .unwrap()
            .set("meanValue", 3.0)
            .unwrap();
        let via_root = ds.root().children("dataset").unwrap()[0]
            .child("flowData")
            .unwrap()
            .unwrap()
            .children("exchange")
            .unwrap();
        assert_eq!(via_root[0].get_f64("meanValue").unwrap(), Some(3.0));
    }

    #[test]
    fn test_default_then_explicit_value() {
        let mut ds = dataset(Generation::V1);
        let id = {
            let mut root = ds.root_mut();
            let mut dataset = root.append("dataset").unwrap();
            let mut flow = dataset.ensure_child("flowData").unwrap();
            flow.append("exchange").unwrap().node_id()
        };

        let exchange = ds.object(id).unwrap();
        assert_eq!(exchange.get_i64("uncertaintyType").unwrap(), Some(1));
        assert_eq!(exchange.get_label("uncertaintyType").unwrap(), Some("lognormal"));

        ds.object_mut(id).unwrap().set("uncertaintyType", 2).unwrap();
        assert_eq!(ds.object(id).unwrap().get_i64("uncertaintyType").unwrap(), Some(2));
    }

    #[test]
    fn test_children_reflect_current_tree() {
        let mut ds = dataset(Generation::V1);
        ds.root_mut().append("dataset").unwrap();
        assert_eq!(ds.root().children("dataset").unwrap().len(), 1);
        ds.root_mut().append("dataset").unwrap();
        assert_eq!(ds.root().children("dataset").unwrap().len(), 2);
        ds.root_mut().unset("dataset").unwrap();
        assert!(ds.root().children("dataset").unwrap().is_empty());
    }

    #[test]
    fn test_detached_node() {
        let mut ds = dataset(Generation::V1);
        let id = ds.root_mut().append("dataset").unwrap().node_id();
        ds.root_mut().unset("dataset").unwrap();
        assert!(matches!(ds.object(id), Err(Error::Detached(_))));
    }

    #[test]
    fn test_field_kind_errors() {
        let ds = dataset(Generation::V2);
        assert!(matches!(
            ds.root().get("activityDataset"),
            Err(Error::FieldKind { .. })
        ));

        let mut ds = dataset(Generation::V2);
        let mut root = ds.root_mut();
        let mut activity_dataset = root.ensure_child("activityDataset").unwrap();
        let mut description = activity_dataset.ensure_child("activityDescription").unwrap();
        let mut activity = description.ensure_child("activity").unwrap();
        activity.set("type", 1).unwrap();
        assert!(matches!(
            activity.as_ref().get_str("type"),
            Err(Error::FieldKind { .. })
        ));
        assert!(matches!(
            activity.as_ref().get_label("id"),
            Err(Error::FieldKind { .. })
        ));
    }

    #[test]
    fn test_set_raw() {
        let mut ds = dataset(Generation::V2);
        let mut root = ds.root_mut();
        let mut activity_dataset = root.ensure_child("activityDataset").unwrap();
        let mut description = activity_dataset.ensure_child("activityDescription").unwrap();
        let mut period = description.ensure_child("timePeriod").unwrap();

        period.set_raw("startDate", "2020-01-01").unwrap();
        assert_eq!(
            period.as_ref().get_date("startDate").unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 1)
        );
        assert!(period.set_raw("endDate", "2020-13-01").is_err());

        period.set_raw("startDate", "").unwrap();
        assert!(matches!(
            period.get("startDate"),
            Err(Error::MissingField { .. })
        ));
    }
}

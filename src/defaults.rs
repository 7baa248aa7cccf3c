//! Schema default registry
//!
//! Maps `(element type, field)` to a default value. Static defaults are raw
//! XML literals taken from the configuration; dynamic defaults are computed
//! from the data object they are filled into. A lookup for an element type
//! without registered defaults is not an error, it simply finds nothing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::binder;
use crate::coercion::decode;
use crate::config::{Config, DefaultTable};
use crate::dataobject::{DataObject, Dataset};
use crate::documents::NodeId;
use crate::error::Result;
use crate::schema::{ElementType, Source};

/// A default computed from the object it is written into
pub type DynamicDefault = Arc<dyn Fn(&DataObject<'_>) -> Option<String> + Send + Sync>;

/// Value written into `Dataset.generator` by [`fill_in`]
pub fn generator_name() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Registry of static and dynamic defaults
#[derive(Clone, Default)]
pub struct DefaultRegistry {
    statics: DefaultTable,
    dynamics: BTreeMap<(String, String), DynamicDefault>,
}

impl DefaultRegistry {
    /// Registry holding `statics` and no dynamic defaults
    pub fn new(statics: DefaultTable) -> Self {
        Self {
            statics,
            dynamics: BTreeMap::new(),
        }
    }

    /// Registry built from a configuration, with the built-in dynamic
    /// defaults registered
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new(config.defaults.clone());
        registry.set_dynamic("Dataset", "generator", |_| Some(generator_name()));
        registry
    }

    /// Static default for `field` of `element_type`
    pub fn get_default(&self, element_type: &str, field: &str) -> Option<&str> {
        self.statics
            .get(element_type)
            .and_then(|fields| fields.get(field))
            .map(|s| s.as_str())
    }

    /// Dynamic default for `field` of `element_type`
    pub fn dynamic(&self, element_type: &str, field: &str) -> Option<&DynamicDefault> {
        self.dynamics
            .get(&(element_type.to_string(), field.to_string()))
    }

    /// Replace the whole static table
    ///
    /// Datasets built from a context created afterwards see the new table;
    /// existing contexts are not affected.
    pub fn replace(&mut self, table: DefaultTable) {
        self.statics = table;
    }

    /// Register (or replace) a dynamic default
    pub fn set_dynamic<F>(&mut self, element_type: &str, field: &str, default: F)
    where
        F: Fn(&DataObject<'_>) -> Option<String> + Send + Sync + 'static,
    {
        self.dynamics.insert(
            (element_type.to_string(), field.to_string()),
            Arc::new(default),
        );
    }

    /// The static table
    pub fn statics(&self) -> &DefaultTable {
        &self.statics
    }
}

impl fmt::Debug for DefaultRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultRegistry")
            .field("statics", &self.statics)
            .field("dynamics", &self.dynamics.keys().collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Fill-in
// =============================================================================

/// Write defaults into every absent field of every element in `dataset`
///
/// Static defaults are applied first; a dynamic default is only used when no
/// static default exists. Fields present with empty text count as absent. A
/// choice member is skipped while another member of its group is present.
/// Returns the number of fields written.
pub fn fill_in(dataset: &mut Dataset) -> Result<usize> {
    let context = Arc::clone(dataset.context());
    let registry = context.registry();
    let root = dataset.document().root();
    let bound = bound_elements(dataset, root)?;

    let mut written = 0;
    for (node, ty) in bound {
        for field in ty.fields {
            if !matches!(field.source, Source::Attribute(_) | Source::Text(_)) {
                continue;
            }
            if binder::is_present(dataset.document(), node, field) {
                continue;
            }
            if let Some(group) = field.choice {
                let active = binder::active_choice(dataset.document(), node, ty, group)?;
                if active.is_some_and(|member| member != field.name) {
                    continue;
                }
            }

            let raw = match registry.get_default(ty.name, field.name) {
                Some(raw) => Some(raw.to_string()),
                None => match registry.dynamic(ty.name, field.name) {
                    Some(dynamic) => dynamic(&DataObject::new(dataset, node, ty)),
                    None => None,
                },
            };
            let Some(raw) = raw else { continue };
            let Some(value) = decode(&raw, field)? else { continue };

            binder::write(dataset.document_mut(), node, ty, field, &value)?;
            written += 1;
        }
    }

    debug!(written, "filled in defaults");
    Ok(written)
}

/// Every element below `start` that binds to an element type, in document
/// order
fn bound_elements(
    dataset: &Dataset,
    start: NodeId,
) -> Result<Vec<(NodeId, &'static ElementType)>> {
    let schema = dataset.schema();
    let doc = dataset.document();
    let mut out = Vec::new();
    let mut stack = vec![(start, dataset.element_type_of(start)?)];

    while let Some((node, ty)) = stack.pop() {
        out.push((node, ty));
        let mut nested = Vec::new();
        for child in doc.children(node) {
            let field = ty.child_field(doc.node(*child).local_name());
            if let Some(child_ty) = field.and_then(|f| f.element_type()) {
                nested.push((*child, schema.resolve(child_ty)?));
            }
        }
        stack.extend(nested.into_iter().rev());
    }
    Ok(out)
}

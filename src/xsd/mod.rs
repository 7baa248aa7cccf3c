//! XML Schema validation
//!
//! A compact XSD 1.0 engine: schema documents are read with `roxmltree` and
//! compiled into declarations, types and content-model particles; documents
//! are then checked element by element against them.
//!
//! Supported: global and local element and attribute declarations, named
//! and anonymous complex and simple types, `xs:include`/`xs:import`, groups
//! and attribute groups, simple and complex content derivation, mixed
//! content, wildcards, `xsi:nil`, the built-in datatypes and every
//! constraining facet except assertions. Identity constraints, substitution
//! groups and `xsi:type` are not evaluated.

pub mod builtins;
pub mod components;
pub mod document_validation;
pub mod facets;
pub mod models;
mod parsing;
pub mod schemas;
pub mod simple_types;

pub use parsing::XSD_NAMESPACE;
pub use schemas::XsdSchema;

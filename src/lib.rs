//! # ecospold
//!
//! Typed, schema-driven access to EcoSpold 1 and EcoSpold 2 life-cycle
//! inventory datasets.
//!
//! Datasets are kept as an XML tree; every element is read and written
//! through a [`DataObject`] view whose field access is checked against static
//! element type descriptors for the dataset's [`Generation`]. Absent fields
//! fall back to configurable registry defaults, values are coerced to and from
//! their semantic types, and documents are checked for conformance when they
//! are loaded.
//!
//! ## Features
//!
//! - EcoSpold 1 (`EcoSpold01`) and EcoSpold 2 (`ecoSpold02`) element types
//! - Loading from files, directory trees and ZIP archives
//! - Validation against the EcoSpold XML Schemas, bundled or configured
//! - Per-file conformance reports, or strict loading
//! - Registry defaults from TOML configuration
//! - Registry code (CAS-style) check digits
//! - JSON export
//! - Protection against oversized or deeply nested input
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ecospold::{Context, Generation, Loader};
//!
//! # fn main() -> ecospold::Result<()> {
//! let context = Arc::new(Context::embedded()?);
//! let loader = Loader::new(context, Generation::V1);
//!
//! let batch = loader.load_directory("datasets")?;
//! for file in batch.valid() {
//!     let root = file.dataset.root();
//!     for dataset in root.children("dataset")? {
//!         println!("{}: {:?}", file.path.display(), dataset.get_i64("number")?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod config;

// XML tree
pub mod namespaces;
pub mod documents;

// Schema and values
pub mod registry_code;
pub mod coercion;
pub mod schema;

// Data objects
pub mod context;
pub mod defaults;
pub mod binder;
pub mod dataobject;

// Input and output
pub mod xsd;
pub mod validation;
pub mod loaders;
pub mod serializer;
pub mod converters;

// Re-exports for convenience
pub use coercion::Value;
pub use config::Config;
pub use context::Context;
pub use converters::to_json;
pub use dataobject::{DataObject, DataObjectMut, Dataset};
pub use defaults::DefaultRegistry;
pub use documents::{Document, NodeId};
pub use error::{Error, Result};
pub use limits::Limits;
pub use loaders::{Batch, FileReport, Loader};
pub use registry_code::RegistryCode;
pub use schema::Generation;
pub use serializer::{save, SaveOptions};
pub use validation::ConformanceIssue;
pub use xsd::XsdSchema;

/// Version of the ecospold library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Shared processing context
//!
//! A [`Context`] bundles everything a dataset needs besides its own tree: the
//! configuration, the default registry built from it, the compiled XML
//! Schema of each generation, and the resource limits. It is immutable once
//! built and shared through an `Arc`; changing defaults or schema paths means
//! building a new context.

use tracing::debug;

use crate::config::Config;
use crate::defaults::DefaultRegistry;
use crate::error::Result;
use crate::limits::Limits;
use crate::schema::Generation;
use crate::xsd::XsdSchema;

/// Configuration, defaults and XML Schemas for a group of datasets
#[derive(Debug)]
pub struct Context {
    config: Config,
    registry: DefaultRegistry,
    v1_xsd: XsdSchema,
    v2_xsd: XsdSchema,
}

impl Context {
    /// Build a context from a configuration
    pub fn new(config: Config) -> Result<Self> {
        let registry = DefaultRegistry::from_config(&config);
        Self::with_registry(config, registry)
    }

    /// Build a context with an explicitly prepared registry
    pub fn with_registry(config: Config, registry: DefaultRegistry) -> Result<Self> {
        let v1_xsd = load_xsd(&config, Generation::V1)?;
        let v2_xsd = load_xsd(&config, Generation::V2)?;
        Ok(Self {
            config,
            registry,
            v1_xsd,
            v2_xsd,
        })
    }

    /// Context built from the configuration compiled into the crate
    pub fn embedded() -> Result<Self> {
        Self::new(Config::embedded()?)
    }

    /// The configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The default registry
    pub fn registry(&self) -> &DefaultRegistry {
        &self.registry
    }

    /// Resource limits
    pub fn limits(&self) -> &Limits {
        &self.config.limits
    }

    /// XML Schema documents of `generation` are validated against
    pub fn xsd_schema(&self, generation: Generation) -> &XsdSchema {
        match generation {
            Generation::V1 => &self.v1_xsd,
            Generation::V2 => &self.v2_xsd,
        }
    }
}

/// The configured schema file, or the bundled schema when none is set
fn load_xsd(config: &Config, generation: Generation) -> Result<XsdSchema> {
    match config.schema_path(generation) {
        Some(path) => {
            let schema = XsdSchema::from_file(path)?;
            debug!(%generation, path = %path.display(), "loaded configured schema");
            Ok(schema)
        }
        None => XsdSchema::bundled(generation),
    }
}

//! TOML configuration
//!
//! One file carries the per-element-type default values, optional XSD paths
//! replacing the bundled schema of a generation, and the resource limits. The crate
//! ships a default configuration (`config/defaults.toml`) compiled in with
//! [`Config::embedded`].
//!
//! ```toml
//! [schemas]
//! v1 = "schemas/EcoSpold01Dataset.xsd"
//!
//! [limits]
//! max_xml_depth = 128
//!
//! [defaults.Exchange]
//! uncertaintyType = "1"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::schema::Generation;

const EMBEDDED: &str = include_str!("../config/defaults.toml");

/// Raw default texts: element type name → field name → literal
pub type DefaultTable = BTreeMap<String, BTreeMap<String, String>>;

/// Paths of the XSD files consulted during validation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaPaths {
    /// EcoSpold 1 XSD
    pub v1: Option<PathBuf>,
    /// EcoSpold 2 XSD
    pub v2: Option<PathBuf>,
}

/// A default literal as written in TOML
///
/// Numbers and booleans are accepted for convenience and stored in their
/// XML lexical form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum Literal {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl Literal {
    fn into_raw(self) -> String {
        match self {
            Literal::Text(s) => s,
            Literal::Integer(i) => i.to_string(),
            Literal::Float(f) => f.to_string(),
            Literal::Boolean(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    schemas: SchemaPaths,
    limits: Limits,
    defaults: BTreeMap<String, BTreeMap<String, Literal>>,
}

/// Loaded configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// XSD paths
    pub schemas: SchemaPaths,
    /// Resource limits
    pub limits: Limits,
    /// Static default values per element type
    pub defaults: DefaultTable,
}

impl Config {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(text)?;
        let defaults = raw
            .defaults
            .into_iter()
            .map(|(section, fields)| {
                let fields = fields
                    .into_iter()
                    .map(|(name, literal)| (name, literal.into_raw()))
                    .collect();
                (section, fields)
            })
            .collect();

        Ok(Self {
            schemas: raw.schemas,
            limits: raw.limits,
            defaults,
        })
    }

    /// Load a configuration file
    ///
    /// Relative schema paths are resolved against the directory holding the
    /// file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&text)?;

        if let Some(base) = path.parent() {
            for slot in [&mut config.schemas.v1, &mut config.schemas.v2] {
                if let Some(schema) = slot {
                    if schema.is_relative() {
                        *schema = base.join(&*schema);
                    }
                }
            }
        }
        Ok(config)
    }

    /// The configuration compiled into the crate
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(EMBEDDED)
    }

    /// Configured XSD path for `generation`
    pub fn schema_path(&self, generation: Generation) -> Option<&Path> {
        match generation {
            Generation::V1 => self.schemas.v1.as_deref(),
            Generation::V2 => self.schemas.v2.as_deref(),
        }
    }
}

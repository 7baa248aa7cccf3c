//! Limits for dataset processing
//!
//! Bounds applied while reading XML and while walking directories or
//! archives, so that a hostile or broken input fails fast instead of
//! exhausting memory.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Resource limits for parsing and batch loading
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum element nesting depth
    pub max_xml_depth: usize,

    /// Maximum size of a single XML file in bytes
    pub max_xml_size: usize,

    /// Maximum number of attributes per element
    pub max_attributes: usize,

    /// Maximum number of entries read from one archive
    pub max_archive_entries: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_depth: 256,
            max_xml_size: 100 * 1024 * 1024, // 100 MB
            max_attributes: 256,
            max_archive_entries: 100_000,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_xml_depth: 64,
            max_xml_size: 10 * 1024 * 1024, // 10 MB
            max_attributes: 64,
            max_archive_entries: 10_000,
        }
    }

    /// Check if XML depth is within limits
    pub fn check_xml_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_xml_depth {
            Err(Error::LimitExceeded(format!(
                "XML depth {} exceeds maximum {}",
                depth, self.max_xml_depth
            )))
        } else {
            Ok(())
        }
    }

    /// Check if XML size is within limits
    pub fn check_xml_size(&self, size: usize) -> Result<()> {
        if size > self.max_xml_size {
            Err(Error::LimitExceeded(format!(
                "XML size {} bytes exceeds maximum {} bytes",
                size, self.max_xml_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if number of attributes is within limits
    pub fn check_attributes(&self, count: usize) -> Result<()> {
        if count > self.max_attributes {
            Err(Error::LimitExceeded(format!(
                "Attribute count {} exceeds maximum {}",
                count, self.max_attributes
            )))
        } else {
            Ok(())
        }
    }

    /// Check if the number of archive entries is within limits
    pub fn check_archive_entries(&self, count: usize) -> Result<()> {
        if count > self.max_archive_entries {
            Err(Error::LimitExceeded(format!(
                "Archive holds {} entries, maximum is {}",
                count, self.max_archive_entries
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_xml_depth, 256);
        assert!(limits.check_xml_depth(100).is_ok());
        assert!(limits.check_xml_depth(300).is_err());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.max_xml_depth < Limits::default().max_xml_depth);
        assert!(limits.check_xml_size(11 * 1024 * 1024).is_err());
    }

    #[test]
    fn test_check_archive_entries() {
        let limits = Limits::default();
        assert!(limits.check_archive_entries(10).is_ok());
        assert!(matches!(
            limits.check_archive_entries(200_000),
            Err(Error::LimitExceeded(_))
        ));
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let limits: Limits = toml::from_str("max_xml_depth = 12").unwrap();
        assert_eq!(limits.max_xml_depth, 12);
        assert_eq!(limits.max_attributes, Limits::default().max_attributes);
    }
}

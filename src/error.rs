//! Error types for ecospold-rs
//!
//! This module defines all error types used throughout the library.
//! Value-level failures ([`ValidationError`]) and syntax failures
//! ([`ParseError`]) carry their own context; structural problems found while
//! checking a whole document are reported as [`ConformanceIssue`]s and only
//! become an [`Error`] when a caller asks for strict behaviour.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ConformanceIssue;

/// Result type alias using the ecospold Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ecospold operations
#[derive(Error, Debug)]
pub enum Error {
    /// A value violates the constraints of its field's semantic type
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Malformed XML syntax
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Access to a field that the element type does not declare
    #[error("unknown field '{field}' on element type '{element_type}'")]
    UnknownField {
        /// Element type name (e.g. `Exchange`)
        element_type: String,
        /// Requested field name
        field: String,
    },

    /// A required field is absent and has no default
    #[error("required field '{field}' on element type '{element_type}' is absent and has no default")]
    MissingField {
        /// Element type name
        element_type: String,
        /// Field name
        field: String,
    },

    /// The field exists but is not of the kind the accessor expects
    #[error("field '{field}' on element type '{element_type}' is {actual}, not {expected}")]
    FieldKind {
        /// Element type name
        element_type: String,
        /// Field name
        field: String,
        /// What the accessor needed
        expected: &'static str,
        /// What the descriptor declares
        actual: &'static str,
    },

    /// A node handle no longer belongs to the dataset tree
    #[error("node at '{0}' is no longer attached to the dataset")]
    Detached(String),

    /// A document does not conform to its schema (strict mode only)
    #[error("{} schema conformance issue(s) in '{}'", .issues.len(), .path.display())]
    SchemaConformance {
        /// File (or archive entry) that failed
        path: PathBuf,
        /// Every issue found in that file
        issues: Vec<ConformanceIssue>,
    },

    /// Invalid configuration
    #[error("config error: {0}")]
    Config(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// XSD file could not be read
    #[error("schema file error: {0}")]
    Xsd(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// TOML configuration syntax error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A value failed the constraints of its semantic type
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error message
    pub message: String,
    /// Field whose value was rejected
    pub field: Option<String>,
    /// The offending raw text
    pub text: Option<String>,
    /// Why the value was rejected
    pub reason: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
            text: None,
            reason: None,
        }
    }

    /// Set the field name
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set the offending text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref field) = self.field {
            write!(f, " (field '{}'", field)?;
            if let Some(ref text) = self.text {
                write!(f, ", value {:?}", text)?;
            }
            write!(f, ")")?;
        } else if let Some(ref text) = self.text {
            write!(f, " (value {:?})", text)?;
        }

        if let Some(ref reason) = self.reason {
            write!(f, ": {}", reason)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// XML syntax error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Byte offset in the input
    pub position: Option<usize>,
    /// File or archive entry that was being parsed
    pub source_name: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            source_name: None,
        }
    }

    /// Set the byte position
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Set the source name
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref name) = self.source_name {
            write!(f, "{}: ", name)?;
        }

        write!(f, "{}", self.message)?;

        if let Some(pos) = self.position {
            write!(f, " at byte {}", pos)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

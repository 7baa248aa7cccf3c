//! Type coercion layer
//!
//! Converts raw XML attribute and element text into typed [`Value`]s and back,
//! enforcing the constraints of each field's [`SemanticType`]. Empty text
//! always means "absent"; a value that violates its type is rejected with a
//! [`ValidationError`] and is never clamped or truncated.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ValidationError};
use crate::registry_code::RegistryCode;
use crate::schema::FieldDescriptor;

// =============================================================================
// Semantic Types
// =============================================================================

/// Enumerated integer codes and their descriptions
#[derive(Debug, PartialEq, Eq)]
pub struct CodeTable {
    /// Table name, used in error messages
    pub name: &'static str,
    /// `(code, description)` pairs
    pub entries: &'static [(i64, &'static str)],
}

impl CodeTable {
    /// Description of `code`
    pub fn label(&self, code: i64) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, label)| *label)
    }

    /// True if `code` is a member of the table
    pub fn contains(&self, code: i64) -> bool {
        self.entries.iter().any(|(c, _)| *c == code)
    }
}

/// Kind of cross-reference key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// UUID identifiers (EcoSpold 2)
    Uuid,
    /// Integer numbers (EcoSpold 1)
    Number,
}

/// Semantic type of a scalar field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SemanticType {
    /// Text, optionally bounded in characters
    String {
        /// Minimum length
        min_len: Option<usize>,
        /// Maximum length
        max_len: Option<usize>,
    },
    /// Signed integer, optionally bounded (inclusive)
    Integer {
        /// Lower bound
        min: Option<i64>,
        /// Upper bound
        max: Option<i64>,
    },
    /// Double precision float (accepts `INF`, `-INF`, `NaN`)
    Float,
    /// Calendar date without a time component
    Date,
    /// Date and time without a timezone
    DateTime,
    /// `true` or `false`
    Boolean,
    /// Member of an enumerated code table
    Code(&'static CodeTable),
    /// Cross-reference key
    Reference(RefKind),
    /// CAS registry number
    RegistryCode,
}

impl SemanticType {
    /// Unbounded string
    pub const TEXT: SemanticType = SemanticType::String {
        min_len: None,
        max_len: None,
    };

    /// Unbounded integer
    pub const INT: SemanticType = SemanticType::Integer {
        min: None,
        max: None,
    };

    /// UUID reference
    pub const UUID: SemanticType = SemanticType::Reference(RefKind::Uuid);

    /// Numeric reference
    pub const NUMBER_REF: SemanticType = SemanticType::Reference(RefKind::Number);

    /// String with an upper length bound
    pub const fn max_len(max: usize) -> SemanticType {
        SemanticType::String {
            min_len: None,
            max_len: Some(max),
        }
    }

    /// String with an exact length
    pub const fn exact_len(len: usize) -> SemanticType {
        SemanticType::String {
            min_len: Some(len),
            max_len: Some(len),
        }
    }

    /// Short name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            SemanticType::String { .. } => "string",
            SemanticType::Integer { .. } => "integer",
            SemanticType::Float => "float",
            SemanticType::Date => "date",
            SemanticType::DateTime => "dateTime",
            SemanticType::Boolean => "boolean",
            SemanticType::Code(_) => "code",
            SemanticType::Reference(RefKind::Uuid) => "uuid reference",
            SemanticType::Reference(RefKind::Number) => "number reference",
            SemanticType::RegistryCode => "registry code",
        }
    }
}

// =============================================================================
// Values
// =============================================================================

/// Typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text (also UUID references)
    String(String),
    /// Integer (also codes and numeric references)
    Integer(i64),
    /// Float
    Float(f64),
    /// Date
    Date(NaiveDate),
    /// Date and time
    DateTime(NaiveDateTime),
    /// Boolean
    Boolean(bool),
    /// Registry code
    RegistryCode(RegistryCode),
}

impl Value {
    /// Variant name
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Date(_) => "date",
            Value::DateTime(_) => "dateTime",
            Value::Boolean(_) => "boolean",
            Value::RegistryCode(_) => "registry code",
        }
    }

    /// Borrow as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a float; integers widen
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as a date
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Get as a date and time
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Borrow as a registry code
    pub fn as_registry_code(&self) -> Option<&RegistryCode> {
        match self {
            Value::RegistryCode(code) => Some(code),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", float_to_xml(*v)),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::RegistryCode(code) => write!(f, "{}", code),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<RegistryCode> for Value {
    fn from(value: RegistryCode) -> Self {
        Value::RegistryCode(value)
    }
}

// =============================================================================
// Lexical forms
// =============================================================================

/// Calendar date format
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp format; fractional seconds are printed only when present
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

const FLOAT_PATTERN: &str = r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$";

const UUID_PATTERN: &str =
    r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$";

static FLOAT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(FLOAT_PATTERN).unwrap());

static UUID_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(UUID_PATTERN).unwrap());

static SPACE_RUN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());

static NEWLINE_RUN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").unwrap());

/// Normalise the text of a repeated text element: runs of two or more spaces
/// (indentation) are dropped and line breaks become single spaces
pub fn normalize_inner_text(text: &str) -> String {
    let without_indent = SPACE_RUN_REGEX.replace_all(text, "");
    NEWLINE_RUN_REGEX
        .replace_all(&without_indent, " ")
        .trim()
        .to_string()
}

fn float_to_xml(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "INF".to_string()
    } else if value == f64::NEG_INFINITY {
        "-INF".to_string()
    } else {
        value.to_string()
    }
}

fn is_uuid(text: &str) -> bool {
    UUID_REGEX.is_match(text)
}

// =============================================================================
// Decode / Encode
// =============================================================================

/// Decode raw XML text for `field`
///
/// Returns `Ok(None)` for empty or whitespace-only text.
pub fn decode(raw: &str, field: &FieldDescriptor) -> Result<Option<Value>> {
    match field.semantic_type() {
        Some(ty) => Ok(decode_as(raw, ty).map_err(|e| e.with_field(field.name))?),
        None => Err(ValidationError::new("element fields carry no text value")
            .with_field(field.name)
            .into()),
    }
}

/// Encode `value` as raw XML text for `field`
pub fn encode(value: &Value, field: &FieldDescriptor) -> Result<String> {
    match field.semantic_type() {
        Some(ty) => Ok(encode_as(value, ty).map_err(|e| e.with_field(field.name))?),
        None => Err(ValidationError::new("element fields carry no text value")
            .with_field(field.name)
            .into()),
    }
}

/// Decode raw XML text under a semantic type
pub fn decode_as(raw: &str, ty: &SemanticType) -> std::result::Result<Option<Value>, ValidationError> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let value = match ty {
        SemanticType::String { .. } => {
            check_length(raw, ty)?;
            Value::String(raw.to_string())
        }
        SemanticType::Integer { .. } => {
            let value = parse_integer(text)?;
            check_bounds(value, ty)?;
            Value::Integer(value)
        }
        SemanticType::Float => Value::Float(parse_float(text)?),
        SemanticType::Date => Value::Date(
            NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| {
                ValidationError::new("invalid date")
                    .with_text(text)
                    .with_reason(e.to_string())
            })?,
        ),
        SemanticType::DateTime => Value::DateTime(parse_datetime(text)?),
        SemanticType::Boolean => match text {
            "true" => Value::Boolean(true),
            "false" => Value::Boolean(false),
            _ => {
                return Err(ValidationError::new("invalid boolean")
                    .with_text(text)
                    .with_reason("only 'true' and 'false' are accepted"))
            }
        },
        SemanticType::Code(table) => {
            let code = parse_integer(text)?;
            check_code(code, table)?;
            Value::Integer(code)
        }
        SemanticType::Reference(RefKind::Uuid) => {
            if !is_uuid(text) {
                return Err(ValidationError::new("invalid reference")
                    .with_text(text)
                    .with_reason("expected a UUID"));
            }
            Value::String(text.to_string())
        }
        SemanticType::Reference(RefKind::Number) => Value::Integer(parse_integer(text)?),
        SemanticType::RegistryCode => Value::RegistryCode(RegistryCode::parse(text)?),
    };
    Ok(Some(value))
}

/// Encode a value under a semantic type, checking the same constraints as
/// [`decode_as`]
pub fn encode_as(value: &Value, ty: &SemanticType) -> std::result::Result<String, ValidationError> {
    let mismatch = || {
        ValidationError::new(format!("cannot store a {} value", value.kind()))
            .with_text(value.to_string())
            .with_reason(format!("field expects a {}", ty.name()))
    };

    match (ty, value) {
        (SemanticType::String { .. }, Value::String(s)) => {
            check_length(s, ty)?;
            Ok(s.clone())
        }
        (SemanticType::Integer { .. }, Value::Integer(i)) => {
            check_bounds(*i, ty)?;
            Ok(i.to_string())
        }
        (SemanticType::Float, Value::Float(f)) => Ok(float_to_xml(*f)),
        (SemanticType::Float, Value::Integer(i)) => Ok(float_to_xml(*i as f64)),
        (SemanticType::Date, Value::Date(d)) => Ok(d.format(DATE_FORMAT).to_string()),
        (SemanticType::DateTime, Value::DateTime(dt)) => {
            Ok(dt.format(DATETIME_FORMAT).to_string())
        }
        (SemanticType::Boolean, Value::Boolean(b)) => Ok(b.to_string()),
        (SemanticType::Code(table), Value::Integer(code)) => {
            check_code(*code, table)?;
            Ok(code.to_string())
        }
        (SemanticType::Reference(RefKind::Uuid), Value::String(s)) => {
            if is_uuid(s) {
                Ok(s.clone())
            } else {
                Err(ValidationError::new("invalid reference")
                    .with_text(s.as_str())
                    .with_reason("expected a UUID"))
            }
        }
        (SemanticType::Reference(RefKind::Number), Value::Integer(i)) => Ok(i.to_string()),
        (SemanticType::RegistryCode, Value::RegistryCode(code)) => Ok(code.to_string()),
        (SemanticType::RegistryCode, Value::String(s)) => Ok(RegistryCode::parse(s)?.to_string()),
        _ => Err(mismatch()),
    }
}

fn parse_integer(text: &str) -> std::result::Result<i64, ValidationError> {
    text.parse::<i64>().map_err(|e| {
        ValidationError::new("invalid integer")
            .with_text(text)
            .with_reason(e.to_string())
    })
}

fn parse_float(text: &str) -> std::result::Result<f64, ValidationError> {
    match text {
        "INF" | "+INF" => return Ok(f64::INFINITY),
        "-INF" => return Ok(f64::NEG_INFINITY),
        "NaN" => return Ok(f64::NAN),
        _ => {}
    }
    if !FLOAT_REGEX.is_match(text) {
        return Err(ValidationError::new("invalid float")
            .with_text(text)
            .with_reason("not a decimal or scientific literal"));
    }
    text.parse::<f64>().map_err(|e| {
        ValidationError::new("invalid float")
            .with_text(text)
            .with_reason(e.to_string())
    })
}

// Offsets are accepted on input and dropped; local time is kept.
fn parse_datetime(text: &str) -> std::result::Result<NaiveDateTime, ValidationError> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.naive_local()))
        .map_err(|e| {
            ValidationError::new("invalid timestamp")
                .with_text(text)
                .with_reason(e.to_string())
        })
}

fn check_length(text: &str, ty: &SemanticType) -> std::result::Result<(), ValidationError> {
    if let SemanticType::String { min_len, max_len } = ty {
        let len = text.chars().count();
        if let Some(min) = min_len {
            if len < *min {
                return Err(ValidationError::new("string too short")
                    .with_text(text)
                    .with_reason(format!("length {} is below the minimum of {}", len, min)));
            }
        }
        if let Some(max) = max_len {
            if len > *max {
                return Err(ValidationError::new("string too long")
                    .with_text(text)
                    .with_reason(format!("length {} exceeds the maximum of {}", len, max)));
            }
        }
    }
    Ok(())
}

fn check_bounds(value: i64, ty: &SemanticType) -> std::result::Result<(), ValidationError> {
    if let SemanticType::Integer { min, max } = ty {
        if min.map_or(false, |m| value < m) || max.map_or(false, |m| value > m) {
            return Err(ValidationError::new("integer out of range")
                .with_text(value.to_string())
                .with_reason(format!(
                    "expected {} <= x <= {}",
                    min.map_or("-inf".to_string(), |m| m.to_string()),
                    max.map_or("inf".to_string(), |m| m.to_string())
                )));
        }
    }
    Ok(())
}

fn check_code(code: i64, table: &CodeTable) -> std::result::Result<(), ValidationError> {
    if table.contains(code) {
        Ok(())
    } else {
        Err(ValidationError::new(format!("unknown {} code", table.name))
            .with_text(code.to_string())
            .with_reason(format!(
                "expected one of {}",
                table
                    .entries
                    .iter()
                    .map(|(c, _)| c.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static COLOURS: CodeTable = CodeTable {
        name: "colour",
        entries: &[(0, "red"), (1, "green")],
    };

    #[test]
    fn test_empty_text_is_absent() {
        for ty in [
            SemanticType::TEXT,
            SemanticType::INT,
            SemanticType::Float,
            SemanticType::Date,
            SemanticType::Boolean,
            SemanticType::RegistryCode,
        ] {
            assert_eq!(decode_as("", &ty).unwrap(), None);
            assert_eq!(decode_as("  \n ", &ty).unwrap(), None);
        }
    }

    #[test]
    fn test_string_bounds() {
        let ty = SemanticType::max_len(3);
        assert!(decode_as("abc", &ty).is_ok());
        let err = decode_as("abcd", &ty).unwrap_err();
        assert_eq!(err.text.as_deref(), Some("abcd"));
        assert!(encode_as(&Value::from("abcd"), &ty).is_err());
        assert!(decode_as("a", &SemanticType::exact_len(2)).is_err());
    }

    #[test]
    fn test_integer_bounds_never_clamp() {
        let ty = SemanticType::Integer {
            min: Some(1),
            max: Some(5),
        };
        assert_eq!(decode_as(" 3 ", &ty).unwrap(), Some(Value::Integer(3)));
        assert!(decode_as("6", &ty).is_err());
        assert!(decode_as("2.5", &ty).is_err());
    }

    #[test]
    fn test_float_lexical_forms() {
        let ty = SemanticType::Float;
        assert_eq!(decode_as("21200", &ty).unwrap(), Some(Value::Float(21200.0)));
        assert_eq!(decode_as("1.5E3", &ty).unwrap(), Some(Value::Float(1500.0)));
        assert_eq!(
            decode_as("-INF", &ty).unwrap(),
            Some(Value::Float(f64::NEG_INFINITY))
        );
        assert!(decode_as("NaN", &ty).unwrap().unwrap().as_f64().unwrap().is_nan());
        assert!(decode_as("inf", &ty).is_err());
        assert!(decode_as("1,5", &ty).is_err());
        assert_eq!(encode_as(&Value::Float(1.22), &ty).unwrap(), "1.22");
        assert_eq!(encode_as(&Value::Float(f64::INFINITY), &ty).unwrap(), "INF");
    }

    #[test]
    fn test_date_and_datetime() {
        let date = decode_as("2021-02-28", &SemanticType::Date).unwrap().unwrap();
        assert_eq!(encode_as(&date, &SemanticType::Date).unwrap(), "2021-02-28");
        assert!(decode_as("2021-02-30", &SemanticType::Date).is_err());
        assert!(decode_as("2021-02-28T10:00:00", &SemanticType::Date).is_err());

        let ts = decode_as("2006-10-31T20:34:59", &SemanticType::DateTime)
            .unwrap()
            .unwrap();
        assert_eq!(
            encode_as(&ts, &SemanticType::DateTime).unwrap(),
            "2006-10-31T20:34:59"
        );
        let offset = decode_as("2006-10-31T20:34:59+01:00", &SemanticType::DateTime)
            .unwrap()
            .unwrap();
        assert_eq!(offset, ts);
    }

    #[test]
    fn test_boolean_literals_only() {
        assert_eq!(
            decode_as("true", &SemanticType::Boolean).unwrap(),
            Some(Value::Boolean(true))
        );
        assert!(decode_as("1", &SemanticType::Boolean).is_err());
        assert!(decode_as("True", &SemanticType::Boolean).is_err());
    }

    #[test]
    fn test_code_tables() {
        let ty = SemanticType::Code(&COLOURS);
        assert_eq!(decode_as("1", &ty).unwrap(), Some(Value::Integer(1)));
        let err = decode_as("7", &ty).unwrap_err();
        assert!(err.message.contains("colour"));
        assert!(encode_as(&Value::Integer(9), &ty).is_err());
        assert_eq!(COLOURS.label(1), Some("green"));
    }

    #[test]
    fn test_references() {
        let uuid = "ffed8e5b-8ecb-4a93-bc79-a1404afd9fcd";
        assert_eq!(
            decode_as(uuid, &SemanticType::UUID).unwrap(),
            Some(Value::from(uuid))
        );
        assert!(decode_as("not-a-uuid", &SemanticType::UUID).is_err());
        assert_eq!(
            decode_as("12", &SemanticType::NUMBER_REF).unwrap(),
            Some(Value::Integer(12))
        );
    }

    #[test]
    fn test_registry_code_field() {
        let value = decode_as("007732-18-5", &SemanticType::RegistryCode)
            .unwrap()
            .unwrap();
        assert_eq!(encode_as(&value, &SemanticType::RegistryCode).unwrap(), "7732-18-5");
        assert!(decode_as("7732-18-4", &SemanticType::RegistryCode).is_err());
    }

    #[test]
    fn test_kind_mismatch() {
        let err = encode_as(&Value::Boolean(true), &SemanticType::Float).unwrap_err();
        assert!(err.message.contains("boolean"));
    }

    #[test]
    fn test_normalize_inner_text() {
        assert_eq!(
            normalize_inner_text("\n        First line\n        second line\n    "),
            "First line second line"
        );
    }
}

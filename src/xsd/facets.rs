//! XSD constraining facets
//!
//! The facets a simple type restriction can carry, and the check of a
//! normalized value against them.

use std::cmp::Ordering;

use regex::Regex;

use crate::error::{Error, Result, ValidationError};

use super::builtins::{compare_values, CheckResult, ValueSpace};

/// White space handling modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    /// Preserve all white space
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace, then collapse runs of spaces and trim
    Collapse,
}

impl WhiteSpace {
    /// Parse the value of a `whiteSpace` facet
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "preserve" => Ok(WhiteSpace::Preserve),
            "replace" => Ok(WhiteSpace::Replace),
            "collapse" => Ok(WhiteSpace::Collapse),
            _ => Err(Error::Xsd(format!("invalid whiteSpace value '{}'", s))),
        }
    }

    /// Normalize a string according to this mode
    pub fn normalize(&self, s: &str) -> String {
        match self {
            WhiteSpace::Preserve => s.to_string(),
            WhiteSpace::Replace => s.replace(['\t', '\n', '\r'], " "),
            WhiteSpace::Collapse => s.split_whitespace().collect::<Vec<_>>().join(" "),
        }
    }
}

/// `pattern` facet, compiled from an XSD regular expression
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Expression as written in the schema
    pub source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile an XSD regular expression
    pub fn new(source: &str) -> Result<Self> {
        let translated = format!("^(?:{})$", translate_pattern(source));
        let regex = Regex::new(&translated)
            .map_err(|e| Error::Xsd(format!("invalid pattern '{}': {}", source, e)))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// True if the whole of `text` matches
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Rewrite the XSD-only parts of a pattern into `regex` syntax
///
/// XSD expressions are implicitly anchored, know the `\i` and `\c` name
/// classes and write class subtraction as `[a-z-[aeiou]]`.
fn translate_pattern(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut class_depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('i') if class_depth > 0 => out.push_str(r"\p{L}_:"),
                Some('i') => out.push_str(r"[\p{L}_:]"),
                Some('I') => out.push_str(r"[^\p{L}_:]"),
                Some('c') if class_depth > 0 => out.push_str(r"\p{L}\p{N}_:.\-"),
                Some('c') => out.push_str(r"[\p{L}\p{N}_:.\-]"),
                Some('C') => out.push_str(r"[^\p{L}\p{N}_:.\-]"),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            '[' => {
                class_depth += 1;
                out.push('[');
            }
            ']' if class_depth > 0 => {
                class_depth -= 1;
                out.push(']');
            }
            '-' if class_depth > 0 && chars.peek() == Some(&'[') => out.push_str("--"),
            _ => out.push(c),
        }
    }
    out
}

/// Facets collected from one or more restriction steps
#[derive(Debug, Clone, Default)]
pub struct Facets {
    /// Exact length
    pub length: Option<usize>,
    /// Minimum length
    pub min_length: Option<usize>,
    /// Maximum length
    pub max_length: Option<usize>,
    /// Alternative patterns of one restriction step (any may match)
    pub patterns: Vec<Pattern>,
    /// Allowed values
    pub enumeration: Vec<String>,
    /// Inclusive lower bound
    pub min_inclusive: Option<String>,
    /// Inclusive upper bound
    pub max_inclusive: Option<String>,
    /// Exclusive lower bound
    pub min_exclusive: Option<String>,
    /// Exclusive upper bound
    pub max_exclusive: Option<String>,
    /// Maximum number of significant digits
    pub total_digits: Option<usize>,
    /// Maximum number of fraction digits
    pub fraction_digits: Option<usize>,
    /// Whitespace processing
    pub white_space: Option<WhiteSpace>,
}

impl Facets {
    /// True if no facet is set
    pub fn is_empty(&self) -> bool {
        self.length.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
            && self.patterns.is_empty()
            && self.enumeration.is_empty()
            && self.min_inclusive.is_none()
            && self.max_inclusive.is_none()
            && self.min_exclusive.is_none()
            && self.max_exclusive.is_none()
            && self.total_digits.is_none()
            && self.fraction_digits.is_none()
            && self.white_space.is_none()
    }

    /// Check a normalized value
    ///
    /// `is_list` makes the length facets count list items; `space` is the
    /// ordering of the primitive base type, if it has one.
    pub fn check(&self, text: &str, is_list: bool, space: Option<ValueSpace>) -> CheckResult {
        let length = if is_list {
            text.split_whitespace().count()
        } else {
            text.chars().count()
        };
        if let Some(expected) = self.length {
            if length != expected {
                return Err(facet_error("length", text, format!("length must be {}", expected)));
            }
        }
        if let Some(min) = self.min_length {
            if length < min {
                return Err(facet_error("minLength", text, format!("length must be at least {}", min)));
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Err(facet_error("maxLength", text, format!("length must be at most {}", max)));
            }
        }

        if !self.patterns.is_empty() && !self.patterns.iter().any(|p| p.is_match(text)) {
            let sources: Vec<&str> = self.patterns.iter().map(|p| p.source.as_str()).collect();
            return Err(facet_error(
                "pattern",
                text,
                format!("does not match '{}'", sources.join("' or '")),
            ));
        }

        let space = space.unwrap_or(ValueSpace::Text);
        if !self.enumeration.is_empty()
            && !self
                .enumeration
                .iter()
                .any(|e| compare_values(space, e, text) == Some(Ordering::Equal))
        {
            return Err(facet_error(
                "enumeration",
                text,
                format!("must be one of {}", self.enumeration.join(", ")),
            ));
        }

        let bounds = [
            (&self.min_inclusive, "minInclusive", "at least", [Ordering::Equal, Ordering::Greater]),
            (&self.max_inclusive, "maxInclusive", "at most", [Ordering::Equal, Ordering::Less]),
            (&self.min_exclusive, "minExclusive", "greater than", [Ordering::Greater, Ordering::Greater]),
            (&self.max_exclusive, "maxExclusive", "less than", [Ordering::Less, Ordering::Less]),
        ];
        for (bound, facet, relation, allowed) in bounds {
            if let Some(bound) = bound {
                match compare_values(space, text, bound) {
                    Some(order) if allowed.contains(&order) => {}
                    _ => {
                        return Err(facet_error(facet, text, format!("must be {} {}", relation, bound)))
                    }
                }
            }
        }

        if self.total_digits.is_some() || self.fraction_digits.is_some() {
            let (total, fraction) = count_digits(text);
            if let Some(max) = self.total_digits {
                if total > max {
                    return Err(facet_error("totalDigits", text, format!("at most {} digits", max)));
                }
            }
            if let Some(max) = self.fraction_digits {
                if fraction > max {
                    return Err(facet_error(
                        "fractionDigits",
                        text,
                        format!("at most {} fraction digits", max),
                    ));
                }
            }
        }

        Ok(())
    }
}

fn facet_error(facet: &str, text: &str, reason: String) -> ValidationError {
    ValidationError::new(format!("value violates {} facet", facet))
        .with_text(text)
        .with_reason(reason)
}

/// Significant and fraction digits of a decimal lexical form
fn count_digits(text: &str) -> (usize, usize) {
    let unsigned = text.trim_start_matches(['+', '-']);
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let int_part = int_part.trim_start_matches('0');
    let frac_part = frac_part.trim_end_matches('0');
    let total = (int_part.len() + frac_part.len()).max(1);
    (total, frac_part.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_space_normalize() {
        assert_eq!(WhiteSpace::Replace.normalize("a\tb\nc"), "a b c");
        assert_eq!(WhiteSpace::Collapse.normalize("  a \n\n b  "), "a b");
        assert_eq!(WhiteSpace::Preserve.normalize(" a "), " a ");
        assert!(WhiteSpace::parse("squash").is_err());
    }

    #[test]
    fn test_pattern_translation() {
        let uuid = Pattern::new("[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap();
        assert!(uuid.is_match("0e0b2d3a-5d3f-4a1b-9c8d-7e6f5a4b3c2d"));
        assert!(!uuid.is_match("x0e0b2d3a-5d3f-4a1b-9c8d-7e6f5a4b3c2d"));

        let names = Pattern::new(r"\i\c*").unwrap();
        assert!(names.is_match("ecoSpold"));
        assert!(!names.is_match("1abc"));

        let consonants = Pattern::new("[a-z-[aeiou]]+").unwrap();
        assert!(consonants.is_match("xyz"));
        assert!(!consonants.is_match("xaz"));
    }

    #[test]
    fn test_length_and_enumeration() {
        let facets = Facets {
            max_length: Some(3),
            enumeration: vec!["1".into(), "2".into(), "10".into()],
            ..Facets::default()
        };
        assert!(facets.check("10", false, Some(ValueSpace::Numeric)).is_ok());
        assert!(facets.check("01", false, Some(ValueSpace::Numeric)).is_ok());
        assert!(facets.check("01", false, Some(ValueSpace::Text)).is_err());
        let err = facets.check("1000", false, None).unwrap_err();
        assert!(err.to_string().contains("maxLength"));
    }

    #[test]
    fn test_range_and_digits() {
        let facets = Facets {
            min_inclusive: Some("1".into()),
            max_exclusive: Some("6".into()),
            total_digits: Some(3),
            fraction_digits: Some(1),
            ..Facets::default()
        };
        let numeric = Some(ValueSpace::Numeric);
        assert!(facets.check("1", false, numeric).is_ok());
        assert!(facets.check("5.5", false, numeric).is_ok());
        assert!(facets.check("0", false, numeric).is_err());
        assert!(facets.check("6", false, numeric).is_err());
        assert!(facets.check("1.25", false, numeric).is_err());
        assert_eq!(count_digits("-001.2300"), (3, 2));
    }

    #[test]
    fn test_list_length_counts_items() {
        let facets = Facets {
            min_length: Some(2),
            ..Facets::default()
        };
        assert!(facets.check("a b", true, None).is_ok());
        assert!(facets.check("ab", true, None).is_err());
    }
}

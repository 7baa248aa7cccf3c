//! XSD simple types
//!
//! A simple type is a built-in, a restriction of another simple type, a list
//! or a union. Restrictions chain to their base, so a value is checked
//! against every step of the derivation.

use std::sync::Arc;

use crate::error::ValidationError;

use super::builtins::{Builtin, CheckResult, ValueSpace};
use super::facets::{Facets, WhiteSpace};

/// Simple type definition
#[derive(Debug, Clone)]
pub enum SimpleType {
    /// Built-in datatype
    Builtin(Builtin),
    /// Derivation by restriction
    Restriction {
        /// Type name, `None` for anonymous types
        name: Option<String>,
        /// Base type
        base: Arc<SimpleType>,
        /// Facets added by this step
        facets: Facets,
    },
    /// Whitespace-separated list of items
    List {
        /// Type name, `None` for anonymous types
        name: Option<String>,
        /// Item type
        item: Arc<SimpleType>,
    },
    /// Value of any of the member types
    Union {
        /// Type name, `None` for anonymous types
        name: Option<String>,
        /// Member types, tried in order
        members: Vec<Arc<SimpleType>>,
    },
}

impl SimpleType {
    /// Shared handle to a built-in type
    pub fn builtin(builtin: Builtin) -> Arc<Self> {
        Arc::new(SimpleType::Builtin(builtin))
    }

    /// Name for messages (`xs:int`, `TString80`, or `anonymous type`)
    pub fn display_name(&self) -> String {
        match self {
            SimpleType::Builtin(b) => format!("xs:{}", b.name()),
            SimpleType::Restriction { name, .. }
            | SimpleType::List { name, .. }
            | SimpleType::Union { name, .. } => name
                .clone()
                .unwrap_or_else(|| "anonymous type".to_string()),
        }
    }

    /// Whitespace processing of the type
    pub fn white_space(&self) -> WhiteSpace {
        match self {
            SimpleType::Builtin(b) => b.white_space(),
            SimpleType::Restriction { base, facets, .. } => {
                facets.white_space.unwrap_or_else(|| base.white_space())
            }
            SimpleType::List { .. } | SimpleType::Union { .. } => WhiteSpace::Collapse,
        }
    }

    /// Primitive ordering, `None` for lists and unions
    pub fn value_space(&self) -> Option<ValueSpace> {
        match self {
            SimpleType::Builtin(b) if !b.is_list() => Some(b.value_space()),
            SimpleType::Builtin(_) => None,
            SimpleType::Restriction { base, .. } => base.value_space(),
            SimpleType::List { .. } | SimpleType::Union { .. } => None,
        }
    }

    /// True if values are lists of items
    pub fn is_list(&self) -> bool {
        match self {
            SimpleType::Builtin(b) => b.is_list(),
            SimpleType::Restriction { base, .. } => base.is_list(),
            SimpleType::List { .. } => true,
            SimpleType::Union { .. } => false,
        }
    }

    /// Validate a raw value: normalize its whitespace, then check it
    pub fn validate(&self, raw: &str) -> CheckResult {
        let text = self.white_space().normalize(raw);
        self.check(&text)
    }

    fn check(&self, text: &str) -> CheckResult {
        match self {
            SimpleType::Builtin(b) => b.check(text),
            SimpleType::Restriction { base, facets, .. } => {
                base.check(text)?;
                facets.check(text, base.is_list(), base.value_space())
            }
            SimpleType::List { item, .. } => {
                for token in text.split_whitespace() {
                    item.validate(token)?;
                }
                Ok(())
            }
            SimpleType::Union { members, .. } => {
                if members.iter().any(|m| m.validate(text).is_ok()) {
                    Ok(())
                } else {
                    Err(ValidationError::new(format!(
                        "value matches no member of {}",
                        self.display_name()
                    ))
                    .with_text(text))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restrict(base: Arc<SimpleType>, facets: Facets) -> Arc<SimpleType> {
        Arc::new(SimpleType::Restriction {
            name: Some("TTest".into()),
            base,
            facets,
        })
    }

    #[test]
    fn test_restriction_chain() {
        let short_string = restrict(
            SimpleType::builtin(Builtin::String),
            Facets {
                max_length: Some(5),
                ..Facets::default()
            },
        );
        let code = restrict(
            short_string.clone(),
            Facets {
                min_length: Some(2),
                ..Facets::default()
            },
        );
        assert!(code.validate("abc").is_ok());
        assert!(code.validate("a").is_err());
        assert!(code.validate("abcdef").is_err());
        assert_eq!(code.display_name(), "TTest");
    }

    #[test]
    fn test_integer_restriction_collapses_whitespace() {
        let percent = restrict(
            SimpleType::builtin(Builtin::Int),
            Facets {
                min_inclusive: Some("0".into()),
                max_inclusive: Some("100".into()),
                ..Facets::default()
            },
        );
        assert!(percent.validate("  42\n").is_ok());
        assert!(percent.validate("101").is_err());
        assert!(percent.validate("4 2").is_err());
    }

    #[test]
    fn test_list_and_union() {
        let years = Arc::new(SimpleType::List {
            name: None,
            item: SimpleType::builtin(Builtin::GYear),
        });
        assert!(years.validate("1999 2000\t2001").is_ok());
        assert!(years.validate("1999 later").is_err());

        let start = SimpleType::Union {
            name: Some("TStart".into()),
            members: vec![
                SimpleType::builtin(Builtin::GYear),
                SimpleType::builtin(Builtin::Date),
            ],
        };
        assert!(start.validate("2000").is_ok());
        assert!(start.validate("2000-01-31").is_ok());
        let err = start.validate("soon").unwrap_err();
        assert!(err.to_string().contains("TStart"));
    }
}

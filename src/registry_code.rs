//! CAS registry numbers
//!
//! A registry code is a run of digits split by hyphens whose last digit is a
//! check digit: the remaining digits, weighted 1, 2, 3, ... from the right,
//! are summed and the sum modulo 10 must equal the check digit. Real-world
//! data does not reliably zero-pad, so any length between
//! [`MIN_DIGITS`] and [`MAX_DIGITS`] is accepted.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Fewest digits a registry code may carry
pub const MIN_DIGITS: usize = 2;

/// Most digits a registry code may carry
pub const MAX_DIGITS: usize = 12;

/// Validated registry code
///
/// Holds the digits with leading zeros stripped. [`fmt::Display`] renders the
/// canonical hyphenated form (`7732-18-5`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryCode {
    digits: String,
}

impl RegistryCode {
    /// Parse and check a registry code
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        let fail = |reason: String| {
            ValidationError::new("invalid registry code")
                .with_text(text)
                .with_reason(reason)
        };

        if trimmed.is_empty() {
            return Err(fail("code is empty".to_string()));
        }
        if !trimmed.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(fail("code must start with a digit".to_string()));
        }
        if let Some(bad) = trimmed.chars().find(|c| !c.is_ascii_digit() && *c != '-') {
            return Err(fail(format!("unexpected character '{}'", bad)));
        }

        let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() < MIN_DIGITS || digits.len() > MAX_DIGITS {
            return Err(fail(format!(
                "code has {} digits, expected {} to {}",
                digits.len(),
                MIN_DIGITS,
                MAX_DIGITS
            )));
        }

        let (body, check) = digits.split_at(digits.len() - 1);
        let expected = check_digit(body)?;
        let actual = check.as_bytes()[0] - b'0';
        if expected != actual {
            return Err(fail(format!(
                "check digit is {}, expected {}",
                actual, expected
            )));
        }

        let stripped = digits.trim_start_matches('0');
        let digits = if stripped.len() < MIN_DIGITS {
            format!("{:0>width$}", stripped, width = MIN_DIGITS)
        } else {
            stripped.to_string()
        };
        Ok(Self { digits })
    }

    /// Build a registry code from its digits given as a number
    pub fn from_number(number: u64) -> Result<Self, ValidationError> {
        Self::parse(&number.to_string())
    }

    /// Digits without hyphens or leading zeros
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// The trailing check digit
    pub fn check(&self) -> u8 {
        self.digits.as_bytes()[self.digits.len() - 1] - b'0'
    }
}

/// Weighted check digit over `body`, which must hold ASCII digits only
pub fn check_digit(body: &str) -> Result<u8, ValidationError> {
    let mut sum: u32 = 0;
    for (i, b) in body.bytes().rev().enumerate() {
        if !b.is_ascii_digit() {
            return Err(ValidationError::new("invalid registry code body")
                .with_text(body)
                .with_reason(format!("unexpected character '{}'", char::from(b))));
        }
        sum += (i as u32 + 1) * u32::from(b - b'0');
    }
    Ok((sum % 10) as u8)
}

impl fmt::Display for RegistryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.digits;
        if d.len() < 4 {
            let (head, check) = d.split_at(d.len() - 1);
            write!(f, "{}-{}", head, check)
        } else {
            let n = d.len();
            write!(f, "{}-{}-{}", &d[..n - 3], &d[n - 3..n - 1], &d[n - 1..])
        }
    }
}

impl FromStr for RegistryCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

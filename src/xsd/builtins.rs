//! XSD built-in datatypes
//!
//! Lexical checks for the primitive and derived datatypes of XML Schema 1.0.
//! Values reach these checks after whitespace processing.

use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;

use super::facets::WhiteSpace;

/// Result of checking one value
pub type CheckResult = std::result::Result<(), ValidationError>;

static INTEGER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").unwrap());
static DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").unwrap());
static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?|[+-]?INF|NaN)$").unwrap()
});
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?\d{4,})-(\d{2})-(\d{2})(Z|[+-]\d{2}:\d{2})?$").unwrap());
static DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?\d{4,})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(\.\d+)?(Z|[+-]\d{2}:\d{2})?$")
        .unwrap()
});
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}):(\d{2}):(\d{2})(\.\d+)?(Z|[+-]\d{2}:\d{2})?$").unwrap());
static GYEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{4,}(Z|[+-]\d{2}:\d{2})?$").unwrap());
static GYEARMONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{4,}-(0[1-9]|1[0-2])(Z|[+-]\d{2}:\d{2})?$").unwrap());
static GMONTH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--(0[1-9]|1[0-2])(Z|[+-]\d{2}:\d{2})?$").unwrap());
static GDAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^---(0[1-9]|[12]\d|3[01])(Z|[+-]\d{2}:\d{2})?$").unwrap());
static GMONTHDAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^--(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])(Z|[+-]\d{2}:\d{2})?$").unwrap()
});
static DURATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?P(\d+Y)?(\d+M)?(\d+D)?(T(\d+H)?(\d+M)?(\d+(\.\d+)?S)?)?$").unwrap()
});
static LANGUAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]{1,8}(-[a-zA-Z0-9]{1,8})*$").unwrap());
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}_:][\p{L}\p{N}_:.\-]*$").unwrap());
static NCNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}_][\p{L}\p{N}_.\-]*$").unwrap());
static NMTOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}\p{N}_:.\-]+$").unwrap());
static QNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([\p{L}_][\p{L}\p{N}_.\-]*:)?[\p{L}_][\p{L}\p{N}_.\-]*$").unwrap()
});
static HEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9a-fA-F]{2})*$").unwrap());
static BASE64_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/ ]*={0,2}$").unwrap());

/// Built-in simple type of XML Schema
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    AnySimpleType,
    String,
    NormalizedString,
    Token,
    Language,
    Name,
    NCName,
    NmToken,
    NmTokens,
    Id,
    IdRef,
    IdRefs,
    Entity,
    Entities,
    AnyUri,
    QName,
    Notation,
    Base64Binary,
    HexBinary,
    Boolean,
    Decimal,
    Integer,
    NonPositiveInteger,
    NegativeInteger,
    Long,
    Int,
    Short,
    Byte,
    NonNegativeInteger,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    PositiveInteger,
    Float,
    Double,
    Duration,
    DateTime,
    Time,
    Date,
    GYearMonth,
    GYear,
    GMonthDay,
    GDay,
    GMonth,
}

/// How values of a built-in type are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSpace {
    /// Compared as text
    Text,
    /// Compared as numbers
    Numeric,
    /// Compared chronologically
    Temporal,
}

impl Builtin {
    /// Look up a built-in type by its local name in the XSD namespace
    pub fn from_name(name: &str) -> Option<Self> {
        use Builtin::*;
        let builtin = match name {
            "anySimpleType" => AnySimpleType,
            "string" => String,
            "normalizedString" => NormalizedString,
            "token" => Token,
            "language" => Language,
            "Name" => Name,
            "NCName" => NCName,
            "NMTOKEN" => NmToken,
            "NMTOKENS" => NmTokens,
            "ID" => Id,
            "IDREF" => IdRef,
            "IDREFS" => IdRefs,
            "ENTITY" => Entity,
            "ENTITIES" => Entities,
            "anyURI" => AnyUri,
            "QName" => QName,
            "NOTATION" => Notation,
            "base64Binary" => Base64Binary,
            "hexBinary" => HexBinary,
            "boolean" => Boolean,
            "decimal" => Decimal,
            "integer" => Integer,
            "nonPositiveInteger" => NonPositiveInteger,
            "negativeInteger" => NegativeInteger,
            "long" => Long,
            "int" => Int,
            "short" => Short,
            "byte" => Byte,
            "nonNegativeInteger" => NonNegativeInteger,
            "unsignedLong" => UnsignedLong,
            "unsignedInt" => UnsignedInt,
            "unsignedShort" => UnsignedShort,
            "unsignedByte" => UnsignedByte,
            "positiveInteger" => PositiveInteger,
            "float" => Float,
            "double" => Double,
            "duration" => Duration,
            "dateTime" => DateTime,
            "time" => Time,
            "date" => Date,
            "gYearMonth" => GYearMonth,
            "gYear" => GYear,
            "gMonthDay" => GMonthDay,
            "gDay" => GDay,
            "gMonth" => GMonth,
            _ => return None,
        };
        Some(builtin)
    }

    /// Local name in the XSD namespace
    pub fn name(&self) -> &'static str {
        use Builtin::*;
        match self {
            AnySimpleType => "anySimpleType",
            String => "string",
            NormalizedString => "normalizedString",
            Token => "token",
            Language => "language",
            Name => "Name",
            NCName => "NCName",
            NmToken => "NMTOKEN",
            NmTokens => "NMTOKENS",
            Id => "ID",
            IdRef => "IDREF",
            IdRefs => "IDREFS",
            Entity => "ENTITY",
            Entities => "ENTITIES",
            AnyUri => "anyURI",
            QName => "QName",
            Notation => "NOTATION",
            Base64Binary => "base64Binary",
            HexBinary => "hexBinary",
            Boolean => "boolean",
            Decimal => "decimal",
            Integer => "integer",
            NonPositiveInteger => "nonPositiveInteger",
            NegativeInteger => "negativeInteger",
            Long => "long",
            Int => "int",
            Short => "short",
            Byte => "byte",
            NonNegativeInteger => "nonNegativeInteger",
            UnsignedLong => "unsignedLong",
            UnsignedInt => "unsignedInt",
            UnsignedShort => "unsignedShort",
            UnsignedByte => "unsignedByte",
            PositiveInteger => "positiveInteger",
            Float => "float",
            Double => "double",
            Duration => "duration",
            DateTime => "dateTime",
            Time => "time",
            Date => "date",
            GYearMonth => "gYearMonth",
            GYear => "gYear",
            GMonthDay => "gMonthDay",
            GDay => "gDay",
            GMonth => "gMonth",
        }
    }

    /// Whitespace processing applied before the lexical check
    pub fn white_space(&self) -> WhiteSpace {
        match self {
            Builtin::AnySimpleType | Builtin::String => WhiteSpace::Preserve,
            Builtin::NormalizedString => WhiteSpace::Replace,
            _ => WhiteSpace::Collapse,
        }
    }

    /// True for the built-in list types
    pub fn is_list(&self) -> bool {
        matches!(self, Builtin::NmTokens | Builtin::IdRefs | Builtin::Entities)
    }

    /// Ordering used by range and enumeration facets
    pub fn value_space(&self) -> ValueSpace {
        use Builtin::*;
        match self {
            Decimal | Integer | NonPositiveInteger | NegativeInteger | Long | Int | Short
            | Byte | NonNegativeInteger | UnsignedLong | UnsignedInt | UnsignedShort
            | UnsignedByte | PositiveInteger | Float | Double => ValueSpace::Numeric,
            DateTime | Time | Date | GYearMonth | GYear | GMonthDay | GDay | GMonth => {
                ValueSpace::Temporal
            }
            _ => ValueSpace::Text,
        }
    }

    fn integer_range(&self) -> Option<(Option<i128>, Option<i128>)> {
        use Builtin::*;
        let range = match self {
            Integer => (None, None),
            NonPositiveInteger => (None, Some(0)),
            NegativeInteger => (None, Some(-1)),
            NonNegativeInteger => (Some(0), None),
            PositiveInteger => (Some(1), None),
            Long => (Some(i64::MIN as i128), Some(i64::MAX as i128)),
            Int => (Some(i32::MIN as i128), Some(i32::MAX as i128)),
            Short => (Some(i16::MIN as i128), Some(i16::MAX as i128)),
            Byte => (Some(i8::MIN as i128), Some(i8::MAX as i128)),
            UnsignedLong => (Some(0), Some(u64::MAX as i128)),
            UnsignedInt => (Some(0), Some(u32::MAX as i128)),
            UnsignedShort => (Some(0), Some(u16::MAX as i128)),
            UnsignedByte => (Some(0), Some(u8::MAX as i128)),
            _ => return None,
        };
        Some(range)
    }

    fn invalid(&self, text: &str) -> ValidationError {
        ValidationError::new(format!("invalid {}", self.name())).with_text(text)
    }

    fn check_regex(&self, re: &Regex, text: &str) -> CheckResult {
        if re.is_match(text) {
            Ok(())
        } else {
            Err(self.invalid(text))
        }
    }

    /// Check `text` against the lexical space of this type
    pub fn check(&self, text: &str) -> CheckResult {
        use Builtin::*;
        if let Some((min, max)) = self.integer_range() {
            return self.check_integer(text, min, max);
        }
        match self {
            AnySimpleType | String | NormalizedString | Token | AnyUri => Ok(()),
            Language => self.check_regex(&LANGUAGE_RE, text),
            Name => self.check_regex(&NAME_RE, text),
            NCName | Id | IdRef | Entity => self.check_regex(&NCNAME_RE, text),
            NmToken => self.check_regex(&NMTOKEN_RE, text),
            QName | Notation => self.check_regex(&QNAME_RE, text),
            NmTokens | IdRefs | Entities => {
                let item_re: &Regex = if *self == NmTokens { &NMTOKEN_RE } else { &NCNAME_RE };
                if text.split_whitespace().next().is_none() {
                    return Err(self.invalid(text).with_reason("list must not be empty"));
                }
                for token in text.split_whitespace() {
                    if !item_re.is_match(token) {
                        return Err(self.invalid(token));
                    }
                }
                Ok(())
            }
            Base64Binary => self.check_regex(&BASE64_RE, text),
            HexBinary => self.check_regex(&HEX_RE, text),
            Boolean => match text {
                "true" | "false" | "1" | "0" => Ok(()),
                _ => Err(self.invalid(text)),
            },
            Decimal => self.check_regex(&DECIMAL_RE, text),
            Float | Double => self.check_regex(&FLOAT_RE, text),
            Duration => {
                if DURATION_RE.is_match(text) && !text.ends_with('P') && !text.ends_with('T') {
                    Ok(())
                } else {
                    Err(self.invalid(text))
                }
            }
            Date => {
                let caps = DATE_RE.captures(text).ok_or_else(|| self.invalid(text))?;
                check_calendar_date(&caps[1], &caps[2], &caps[3])
                    .map_err(|reason| self.invalid(text).with_reason(reason))
            }
            DateTime => {
                let caps = DATETIME_RE.captures(text).ok_or_else(|| self.invalid(text))?;
                check_calendar_date(&caps[1], &caps[2], &caps[3])
                    .and_then(|_| check_clock_time(&caps[4], &caps[5], &caps[6]))
                    .map_err(|reason| self.invalid(text).with_reason(reason))
            }
            Time => {
                let caps = TIME_RE.captures(text).ok_or_else(|| self.invalid(text))?;
                check_clock_time(&caps[1], &caps[2], &caps[3])
                    .map_err(|reason| self.invalid(text).with_reason(reason))
            }
            GYear => self.check_regex(&GYEAR_RE, text),
            GYearMonth => self.check_regex(&GYEARMONTH_RE, text),
            GMonth => self.check_regex(&GMONTH_RE, text),
            GDay => self.check_regex(&GDAY_RE, text),
            GMonthDay => self.check_regex(&GMONTHDAY_RE, text),
            _ => Ok(()),
        }
    }

    fn check_integer(&self, text: &str, min: Option<i128>, max: Option<i128>) -> CheckResult {
        if !INTEGER_RE.is_match(text) {
            return Err(self.invalid(text));
        }
        let out_of_range = || self.invalid(text).with_reason("value out of range");
        match text.parse::<i128>() {
            Ok(value) => {
                if min.map_or(false, |m| value < m) || max.map_or(false, |m| value > m) {
                    return Err(out_of_range());
                }
                Ok(())
            }
            // Wider than i128: only unbounded sides accept it
            Err(_) => {
                let negative = text.starts_with('-');
                if (negative && min.is_some()) || (!negative && max.is_some()) {
                    Err(out_of_range())
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn check_calendar_date(year: &str, month: &str, day: &str) -> std::result::Result<(), String> {
    let month: u32 = month.parse().map_err(|_| "invalid month".to_string())?;
    let day: u32 = day.parse().map_err(|_| "invalid day".to_string())?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err("month or day out of range".to_string());
    }
    // Years outside chrono's range only get the coarse check above
    if let Ok(year) = year.parse::<i32>() {
        if year.abs() <= 200_000 && NaiveDate::from_ymd_opt(year, month, day).is_none() {
            return Err(format!("day {} does not exist in month {}", day, month));
        }
    }
    Ok(())
}

fn check_clock_time(hour: &str, minute: &str, second: &str) -> std::result::Result<(), String> {
    let parse = |s: &str| s.parse::<u32>().map_err(|_| "invalid time".to_string());
    let (h, m, s) = (parse(hour)?, parse(minute)?, parse(second)?);
    if h == 24 && m == 0 && s == 0 {
        return Ok(());
    }
    NaiveTime::from_hms_opt(h, m, s)
        .map(|_| ())
        .ok_or_else(|| "time out of range".to_string())
}

/// Compare two already valid values of `space`
///
/// Returns `None` when the values are not comparable (for example two dates
/// with and without a timezone in different lexical shapes).
pub fn compare_values(space: ValueSpace, a: &str, b: &str) -> Option<Ordering> {
    match space {
        ValueSpace::Numeric => {
            let parse = |s: &str| -> Option<f64> {
                match s {
                    "INF" | "+INF" => Some(f64::INFINITY),
                    "-INF" => Some(f64::NEG_INFINITY),
                    "NaN" => None,
                    _ => s.parse().ok(),
                }
            };
            parse(a)?.partial_cmp(&parse(b)?)
        }
        ValueSpace::Temporal => {
            // Same-shaped lexical forms without timezone sort chronologically,
            // except for negative years
            let strip = |s: &str| s.trim_end_matches('Z').to_string();
            let (a, b) = (strip(a), strip(b));
            if a.len() == b.len() && !a.starts_with('-') && !b.starts_with('-') {
                Some(a.cmp(&b))
            } else {
                None
            }
        }
        ValueSpace::Text => Some(a.cmp(b)),
    }
}

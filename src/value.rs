//! Value kinds an option can hold and the string conversions for each.
//!
//! The set of supported kinds is closed: every option field reports a
//! [`FieldShape`] built from [`ValueKind`]s, and conversion is an exhaustive
//! match instead of a lookup keyed by runtime type.

use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

// -- Enum metadata ------------------------------------------------------------

/// Name and ordered variant labels of an enum usable as an option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumKind {
    name: &'static str,
    variants: &'static [&'static str],
}

impl EnumKind {
    pub const fn new(name: &'static str, variants: &'static [&'static str]) -> Self {
        EnumKind { name, variants }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn variants(&self) -> &'static [&'static str] {
        self.variants
    }

    /// Exact match first, then the uppercased text.
    pub fn lookup(&self, text: &str) -> Option<EnumValue> {
        let found = self.position(text).or_else(|| {
            let upper = text.to_ascii_uppercase();
            self.position(&upper)
        })?;
        Some(EnumValue {
            variant: self.variants[found],
            ordinal: found,
        })
    }

    fn position(&self, text: &str) -> Option<usize> {
        self.variants.iter().position(|v| *v == text)
    }
}

/// A resolved enum variant. Ordered by declaration position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    pub variant: &'static str,
    pub ordinal: usize,
}

// -- Time values --------------------------------------------------------------

static RE_TIMEVAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:\d+\s*(?:ms|d|h|m|s)?\s*)+$").unwrap());

static RE_TIMEVAL_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(ms|d|h|m|s)?").unwrap());

const MS_PER_SECOND: u64 = 1000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;

/// A duration with millisecond resolution, written like `1h30m`, `90s`,
/// `250ms` or a bare millisecond count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeVal(u64);

impl TimeVal {
    pub const fn from_millis(ms: u64) -> Self {
        TimeVal(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeValParseError(String);

impl fmt::Display for TimeValParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid time value: {}", self.0)
    }
}

impl std::error::Error for TimeValParseError {}

impl FromStr for TimeVal {
    type Err = TimeValParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !RE_TIMEVAL.is_match(s) {
            return Err(TimeValParseError(s.to_string()));
        }
        let mut total: u64 = 0;
        for caps in RE_TIMEVAL_SEGMENT.captures_iter(s) {
            let amount: u64 = caps[1]
                .parse()
                .map_err(|_| TimeValParseError(s.to_string()))?;
            let unit = match caps.get(2).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
                Some("d") => MS_PER_DAY,
                Some("h") => MS_PER_HOUR,
                Some("m") => MS_PER_MINUTE,
                Some("s") => MS_PER_SECOND,
                _ => 1,
            };
            total = amount
                .checked_mul(unit)
                .and_then(|ms| total.checked_add(ms))
                .ok_or_else(|| TimeValParseError(s.to_string()))?;
        }
        Ok(TimeVal(total))
    }
}

impl fmt::Display for TimeVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("0ms");
        }
        let mut rest = self.0;
        for (unit, label) in [
            (MS_PER_DAY, "d"),
            (MS_PER_HOUR, "h"),
            (MS_PER_MINUTE, "m"),
            (MS_PER_SECOND, "s"),
            (1, "ms"),
        ] {
            if rest >= unit {
                write!(f, "{}{}", rest / unit, label)?;
                rest %= unit;
            }
        }
        Ok(())
    }
}

// -- Kinds and values -----------------------------------------------------------

/// Scalar kinds supported as option values, map keys, map values and
/// collection elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Str,
    File,
    TimeVal,
    Enum(EnumKind),
}

impl ValueKind {
    /// Convert option text to a value of this kind. `None` means the text is
    /// not a valid spelling; callers turn that into a reportable error.
    pub fn translate(&self, text: &str) -> Option<Value> {
        match self {
            ValueKind::Bool => {
                if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("yes") {
                    Some(Value::Bool(true))
                } else if text.eq_ignore_ascii_case("false") || text.eq_ignore_ascii_case("no") {
                    Some(Value::Bool(false))
                } else {
                    None
                }
            }
            ValueKind::Byte => text.parse().ok().map(Value::Byte),
            ValueKind::Short => text.parse().ok().map(Value::Short),
            ValueKind::Int => text.parse().ok().map(Value::Int),
            ValueKind::Long => text.parse().ok().map(Value::Long),
            ValueKind::Float => text.parse().ok().map(Value::Float),
            ValueKind::Double => text.parse().ok().map(Value::Double),
            ValueKind::Str => Some(Value::Str(text.to_string())),
            ValueKind::File => Some(Value::File(PathBuf::from(text))),
            ValueKind::TimeVal => text.parse().ok().map(Value::TimeVal),
            ValueKind::Enum(kind) => kind.lookup(text).map(Value::Enum),
        }
    }

    /// Short lowercase type name used in messages.
    pub fn simple_name(&self) -> &'static str {
        match self {
            ValueKind::Bool => "boolean",
            ValueKind::Byte => "byte",
            ValueKind::Short => "short",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::Str => "string",
            ValueKind::File => "file",
            ValueKind::TimeVal => "timeval",
            ValueKind::Enum(kind) => kind.name(),
        }
    }
}

/// Storage layout of an option field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    Scalar(ValueKind),
    Collection(ValueKind),
    Map(ValueKind, ValueKind),
}

impl FieldShape {
    pub fn is_boolean(&self) -> bool {
        matches!(self, FieldShape::Scalar(ValueKind::Bool))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, FieldShape::Map(..))
    }

    /// Only scalars carry a total order usable by GREATEST/LEAST.
    pub fn is_ordered(&self) -> bool {
        matches!(self, FieldShape::Scalar(_))
    }

    /// Type name reported for missing arguments.
    pub fn type_name(&self) -> String {
        match self {
            FieldShape::Scalar(kind) | FieldShape::Collection(kind) => {
                kind.simple_name().to_ascii_lowercase()
            }
            FieldShape::Map(..) => "map".to_string(),
        }
    }
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldShape::Scalar(kind) => f.write_str(kind.simple_name()),
            FieldShape::Collection(kind) => write!(f, "collection<{}>", kind.simple_name()),
            FieldShape::Map(key, value) => {
                write!(f, "map<{}, {}>", key.simple_name(), value.simple_name())
            }
        }
    }
}

/// A converted option value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    File(PathBuf),
    TimeVal(TimeVal),
    Enum(EnumValue),
}

impl Value {
    /// Order two values of the same kind. `None` for mixed kinds.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Byte(a), Value::Byte(b)) => Some(a.cmp(b)),
            (Value::Short(a), Value::Short(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Long(a), Value::Long(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Some(a.total_cmp(b)),
            (Value::Double(a), Value::Double(b)) => Some(a.total_cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::File(a), Value::File(b)) => Some(a.cmp(b)),
            (Value::TimeVal(a), Value::TimeVal(b)) => Some(a.cmp(b)),
            (Value::Enum(a), Value::Enum(b)) => Some(a.ordinal.cmp(&b.ordinal)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Str(v) => f.write_str(v),
            Value::File(v) => write!(f, "{}", v.display()),
            Value::TimeVal(v) => write!(f, "{}", v),
            Value::Enum(v) => f.write_str(v.variant),
        }
    }
}

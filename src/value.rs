//! # Metadata Values
//!
//! Metadata values are stored as a closed, tagged union instead of untyped
//! objects. Reading a value as a concrete Rust type goes through the
//! [`FromValue`] trait, which encodes the complete list of conversions the
//! store is willing to make:
//!
//! | Requested          | Accepted stored values                                  |
//! |--------------------|---------------------------------------------------------|
//! | `String`           | any scalar (rendered), path, date                       |
//! | `bool`             | bool, `"true"`/`"false"` (any case)                     |
//! | integers           | int, integral float, numeric string                     |
//! | `f64`              | float, int, numeric string                              |
//! | `PathBuf`          | path, string                                            |
//! | dates              | date, RFC 3339 / `YYYY-MM-DD[ HH:MM:SS]` strings        |
//! | `Vec<T>`           | list whose every element converts, or one convertible value |
//!
//! A one-element list also converts to the scalar it holds. Every other
//! combination is a failed conversion, which typed getters turn into the
//! caller's default.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A single metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Path(PathBuf),
    DateTime(DateTime<FixedOffset>),
    List(Vec<Value>),
    /// Ordered mapping; keys keep their document order.
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Name of the variant, used in log messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Path(_) => "path",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert this value to `T`, returning `None` when no rule applies.
    pub fn convert<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }

    /// Build a value from parsed YAML.
    ///
    /// Tagged nodes are unwrapped to their inner value and non-string
    /// mapping keys are rendered as strings.
    pub fn from_yaml(yaml: serde_yaml::Value) -> Self {
        match yaml {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::String(n.to_string())
                }
            }
            serde_yaml::Value::String(s) => Value::String(s),
            serde_yaml::Value::Sequence(items) => {
                Value::List(items.into_iter().map(Value::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(mapping) => Value::Map(
                mapping
                    .into_iter()
                    .map(|(k, v)| (yaml_key_to_string(k), Value::from_yaml(v)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from_yaml(tagged.value),
        }
    }
}

/// Render a YAML mapping key as a metadata key.
pub(crate) fn yaml_key_to_string(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            Value::Path(p) => write!(f, "{}", p.display()),
            Value::DateTime(d) => write!(f, "{}", d.to_rfc3339()),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::String(s) => serializer.serialize_str(s),
            Value::Path(p) => serializer.serialize_str(&p.to_string_lossy()),
            Value::DateTime(d) => serializer.serialize_str(&d.to_rfc3339()),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    i64 => Int,
    i32 => Int,
    u32 => Int,
    f64 => Float,
    String => String,
    &str => String,
    PathBuf => Path,
    DateTime<FixedOffset> => DateTime,
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::DateTime(v.fixed_offset())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Conversion from a stored [`Value`] into a concrete type.
///
/// Implementations return `None` when the value cannot be represented as
/// `Self`; they never panic.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

/// Unwrap a one-element list so scalar conversions can see its element.
fn single(value: &Value) -> Option<&Value> {
    match value {
        Value::List(items) if items.len() == 1 => Some(&items[0]),
        _ => None,
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null | Value::Map(_) => None,
            Value::List(_) => single(value).and_then(String::from_value),
            other => Some(other.to_string()),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Value::List(_) => single(value).and_then(bool::from_value),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(i) => Some(*i),
            Value::Float(x) if x.fract() == 0.0 && x.is_finite() => {
                if *x >= i64::MIN as f64 && *x < i64::MAX as f64 {
                    Some(*x as i64)
                } else {
                    None
                }
            }
            Value::String(s) => s.trim().parse().ok(),
            Value::List(_) => single(value).and_then(i64::from_value),
            _ => None,
        }
    }
}

macro_rules! impl_from_value_via_i64 {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    i64::from_value(value).and_then(|i| <$ty>::try_from(i).ok())
                }
            }
        )*
    };
}

impl_from_value_via_i64!(i32, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            Value::String(s) => s.trim().parse().ok(),
            Value::List(_) => single(value).and_then(f64::from_value),
            _ => None,
        }
    }
}

impl FromValue for PathBuf {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Path(p) => Some(p.clone()),
            Value::String(s) => Some(PathBuf::from(s)),
            Value::List(_) => single(value).and_then(PathBuf::from_value),
            _ => None,
        }
    }
}

impl FromValue for DateTime<FixedOffset> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::DateTime(d) => Some(*d),
            Value::String(s) => parse_datetime(s.trim()),
            Value::List(_) => single(value).and_then(DateTime::<FixedOffset>::from_value),
            _ => None,
        }
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Option<Self> {
        DateTime::<FixedOffset>::from_value(value).map(|d| d.date_naive())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            Value::Null => None,
            other => T::from_value(other).map(|v| vec![v]),
        }
    }
}

/// Parse the date formats metadata authors commonly write.
///
/// Values without an offset are taken as UTC.
fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d);
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
}

//! Raw cell values exchanged with row sources and command sinks.
//!
//! [`Value`] is the dynamically typed currency of the engine: row sources
//! hand them out, command sinks receive them, and the
//! [`FieldValue`](crate::FieldValue) conversions translate between them and
//! the statically typed members of an entity.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::types::StorageType;

/// A raw value read from a row or bound to a command.
///
/// [`Value::Null`] is the "no value" marker: absent members are bound as
/// `Null` rather than omitted, and `Null` cells convert to the member's
/// absence representation on read.
///
/// # Examples
///
/// ```
/// use tablemap_core::{StorageType, Value};
///
/// let v = Value::from("hello");
/// assert_eq!(v.storage_type(), StorageType::String);
/// assert!(!v.is_null());
/// assert!(Value::from(None::<i32>).is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    Bool(bool),
    U8(u8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    String(String),
    Chars(Vec<char>),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
    Interval(TimeDelta),
    Uuid(Uuid),
}

impl Value {
    /// Returns `true` for the "no value" marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in conversion error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Chars(_) => "chars",
            Value::Bytes(_) => "bytes",
            Value::DateTime(_) => "datetime",
            Value::Interval(_) => "interval",
            Value::Uuid(_) => "uuid",
        }
    }

    /// Storage type inferred from the value itself.
    ///
    /// Used when a parameter is bound without a member to take the type
    /// from. `Null` carries no type and resolves to [`StorageType::Object`].
    pub fn storage_type(&self) -> StorageType {
        match self {
            Value::Null => StorageType::Object,
            Value::Bool(_) => StorageType::Boolean,
            Value::U8(_) => StorageType::Byte,
            Value::I16(_) => StorageType::Int16,
            Value::I32(_) => StorageType::Int32,
            Value::I64(_) => StorageType::Int64,
            Value::F32(_) => StorageType::Single,
            Value::F64(_) => StorageType::Double,
            Value::Decimal(_) => StorageType::Decimal,
            Value::String(_) | Value::Chars(_) => StorageType::String,
            Value::Bytes(_) => StorageType::Binary,
            Value::DateTime(_) => StorageType::DateTime,
            Value::Interval(_) => StorageType::Time,
            Value::Uuid(_) => StorageType::Guid,
        }
    }

    /// Integral view of the value, if it holds an integer or a boolean.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::U8(v) => Some(i64::from(*v)),
            Value::I16(v) => Some(i64::from(*v)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// String view of the value, if it holds text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Chars(v) => v.iter().try_for_each(|c| write!(f, "{c}")),
            Value::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Value::DateTime(v) => write!(f, "{v}"),
            Value::Interval(v) => write!(f, "{v}"),
            Value::Uuid(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    u8 => U8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    String => String,
    Vec<char> => Chars,
    Vec<u8> => Bytes,
    NaiveDateTime => DateTime,
    TimeDelta => Interval,
    Uuid => Uuid,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Failure to coerce a raw [`Value`] into a member's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// The raw value has a shape the target type cannot accept.
    #[error("cannot convert {found} value to {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The raw value does not fit in the target type.
    #[error("value {value} is out of range for {expected}")]
    OutOfRange { expected: &'static str, value: String },

    /// Text could not be parsed into the target type.
    #[error("cannot parse '{input}' as {expected}: {reason}")]
    Parse {
        expected: &'static str,
        input: String,
        reason: String,
    },

    /// An integral value names no variant of the target enumeration.
    #[error("{value} is not a defined discriminant of {enum_name}")]
    UndefinedDiscriminant { enum_name: &'static str, value: i64 },
}

impl ValueError {
    pub(crate) fn mismatch(expected: &'static str, found: &Value) -> Self {
        ValueError::TypeMismatch {
            expected,
            found: found.type_name(),
        }
    }

    pub(crate) fn parse(expected: &'static str, input: &str, reason: impl fmt::Display) -> Self {
        ValueError::Parse {
            expected,
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}

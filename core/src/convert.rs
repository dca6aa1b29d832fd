//! Conversions between member types and raw [`Value`]s.
//!
//! [`FieldValue`] is implemented for every type listed in the storage table,
//! for `Option` of each of them, and for collections of nested entities
//! (which report [`ValueKind::Object`] and therefore default to being
//! ignored). Fieldless enumerations get an implementation from
//! `#[derive(MapEnum)]`.
//!
//! # Coercion rules
//!
//! - `Null` becomes `None` for optional members and the type's zero value
//!   otherwise.
//! - Integers convert between widths with range checks, and into `bool`,
//!   floats and decimals.
//! - Text parses into numbers, date-times, UUIDs and decimals.
//! - A 16-byte blob converts into a UUID.
//! - Undefined enumeration discriminants are never defaulted: see
//!   [`Discriminant`].

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeDelta};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use uuid::Uuid;

use crate::descriptor::Entity;
use crate::types::{IntegralRepr, SemanticType, ValueKind};
use crate::value::{Value, ValueError};

/// A type that can occupy a mapped member.
///
/// # Examples
///
/// ```
/// use tablemap_core::{FieldValue, Value};
///
/// assert_eq!(i32::from_value(Value::I64(42)).unwrap(), 42);
/// assert_eq!(Option::<i32>::from_value(Value::Null).unwrap(), None);
/// assert_eq!(i32::from_value(Value::Null).unwrap(), 0);
/// assert_eq!("x".to_string().to_value(), Value::String("x".into()));
/// ```
pub trait FieldValue: Sized {
    /// Semantic type reported to the classifier and the storage table.
    fn semantic_type() -> SemanticType;

    /// Converts the member into a raw value for binding.
    fn to_value(&self) -> Value;

    /// Coerces a raw value read from a row into the member type.
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

fn integral(name: &'static str, value: &Value) -> Result<i64, ValueError> {
    if let Some(v) = value.as_i64() {
        return Ok(v);
    }
    match value {
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| ValueError::parse(name, s, e)),
        Value::Decimal(d) if d.fract().is_zero() => d.to_i64().ok_or(ValueError::OutOfRange {
            expected: name,
            value: d.to_string(),
        }),
        other => Err(ValueError::mismatch(name, other)),
    }
}

macro_rules! integral_field {
    ($($ty:ty => $kind:ident, $variant:ident, $name:literal;)*) => {
        $(
            impl FieldValue for $ty {
                fn semantic_type() -> SemanticType {
                    SemanticType::required(ValueKind::$kind)
                }

                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }

                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Null => Ok(0),
                        Value::$variant(v) => Ok(v),
                        other => {
                            let wide = integral($name, &other)?;
                            <$ty>::try_from(wide).map_err(|_| ValueError::OutOfRange {
                                expected: $name,
                                value: wide.to_string(),
                            })
                        }
                    }
                }
            }
        )*
    };
}

integral_field! {
    u8 => Byte, U8, "u8";
    i16 => Int16, I16, "i16";
    i32 => Int32, I32, "i32";
    i64 => Int64, I64, "i64";
}

impl FieldValue for bool {
    fn semantic_type() -> SemanticType {
        SemanticType::required(ValueKind::Bool)
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(ValueError::parse("bool", &s, "expected true/false or 1/0")),
            },
            other => other
                .as_i64()
                .map(|v| v != 0)
                .ok_or_else(|| ValueError::mismatch("bool", &other)),
        }
    }
}

impl FieldValue for f64 {
    fn semantic_type() -> SemanticType {
        SemanticType::required(ValueKind::Double)
    }

    fn to_value(&self) -> Value {
        Value::F64(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(0.0),
            Value::F64(v) => Ok(v),
            Value::F32(v) => Ok(f64::from(v)),
            Value::Decimal(d) => d.to_f64().ok_or(ValueError::OutOfRange {
                expected: "f64",
                value: d.to_string(),
            }),
            Value::String(s) => s.trim().parse().map_err(|e| ValueError::parse("f64", &s, e)),
            other => other
                .as_i64()
                .map(|v| v as f64)
                .ok_or_else(|| ValueError::mismatch("f64", &other)),
        }
    }
}

impl FieldValue for f32 {
    fn semantic_type() -> SemanticType {
        SemanticType::required(ValueKind::Single)
    }

    fn to_value(&self) -> Value {
        Value::F32(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::F32(v) => Ok(v),
            other => {
                let wide = f64::from_value(other)?;
                if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
                    return Err(ValueError::OutOfRange {
                        expected: "f32",
                        value: wide.to_string(),
                    });
                }
                Ok(wide as f32)
            }
        }
    }
}

impl FieldValue for Decimal {
    fn semantic_type() -> SemanticType {
        SemanticType::required(ValueKind::Decimal)
    }

    fn to_value(&self) -> Value {
        Value::Decimal(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(Decimal::ZERO),
            Value::Decimal(d) => Ok(d),
            Value::F64(v) => Decimal::try_from(v).map_err(|_| ValueError::OutOfRange {
                expected: "decimal",
                value: v.to_string(),
            }),
            Value::F32(v) => Decimal::try_from(v).map_err(|_| ValueError::OutOfRange {
                expected: "decimal",
                value: v.to_string(),
            }),
            Value::String(s) => {
                Decimal::from_str(s.trim()).map_err(|e| ValueError::parse("decimal", &s, e))
            }
            other => other
                .as_i64()
                .map(Decimal::from)
                .ok_or_else(|| ValueError::mismatch("decimal", &other)),
        }
    }
}

impl FieldValue for String {
    fn semantic_type() -> SemanticType {
        SemanticType::required(ValueKind::String)
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(String::new()),
            Value::String(s) => Ok(s),
            Value::Chars(c) => Ok(c.into_iter().collect()),
            other => Err(ValueError::mismatch("string", &other)),
        }
    }
}

impl FieldValue for Vec<char> {
    fn semantic_type() -> SemanticType {
        SemanticType::required(ValueKind::Chars)
    }

    fn to_value(&self) -> Value {
        Value::Chars(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Chars(c) => Ok(c),
            Value::String(s) => Ok(s.chars().collect()),
            other => Err(ValueError::mismatch("chars", &other)),
        }
    }
}

impl FieldValue for Vec<u8> {
    fn semantic_type() -> SemanticType {
        SemanticType::required(ValueKind::Binary)
    }

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Bytes(b) => Ok(b),
            other => Err(ValueError::mismatch("bytes", &other)),
        }
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

fn parse_datetime(s: &str) -> Result<NaiveDateTime, ValueError> {
    let trimmed = s.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(dt);
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.naive_utc())
        .map_err(|e| ValueError::parse("datetime", s, e))
}

impl FieldValue for NaiveDateTime {
    fn semantic_type() -> SemanticType {
        SemanticType::required(ValueKind::DateTime)
    }

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(NaiveDateTime::default()),
            Value::DateTime(dt) => Ok(dt),
            Value::String(s) => parse_datetime(&s),
            other => Err(ValueError::mismatch("datetime", &other)),
        }
    }
}

/// Intervals travel as integral microseconds when the source has no
/// native interval type.
impl FieldValue for TimeDelta {
    fn semantic_type() -> SemanticType {
        SemanticType::required(ValueKind::Interval)
    }

    fn to_value(&self) -> Value {
        Value::Interval(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(TimeDelta::zero()),
            Value::Interval(d) => Ok(d),
            other => integral("interval", &other).map(TimeDelta::microseconds),
        }
    }
}

impl FieldValue for Uuid {
    fn semantic_type() -> SemanticType {
        SemanticType::required(ValueKind::Uuid)
    }

    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(Uuid::nil()),
            Value::Uuid(u) => Ok(u),
            Value::String(s) => Uuid::parse_str(s.trim()).map_err(|e| ValueError::parse("uuid", &s, e)),
            Value::Bytes(b) => Uuid::from_slice(&b).map_err(|_| ValueError::OutOfRange {
                expected: "uuid",
                value: format!("<{} bytes>", b.len()),
            }),
            other => Err(ValueError::mismatch("uuid", &other)),
        }
    }
}

impl<V: FieldValue> FieldValue for Option<V> {
    fn semantic_type() -> SemanticType {
        V::semantic_type().into_nullable()
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, FieldValue::to_value)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => V::from_value(other).map(Some),
        }
    }
}

/// Nested entity collections are not loaded or bound; they exist so that
/// relationship members can sit on an entity and default to `Ignore`.
impl<E: Entity> FieldValue for Vec<E> {
    fn semantic_type() -> SemanticType {
        SemanticType::required(ValueKind::Object(std::any::type_name::<Vec<E>>()))
    }

    fn to_value(&self) -> Value {
        Value::Null
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(Vec::new()),
            other => Err(ValueError::mismatch("entity collection", &other)),
        }
    }
}

/// A fieldless enumeration stored through an integral representation.
///
/// Implemented by `#[derive(MapEnum)]`, which also implements
/// [`FieldValue`] through [`enum_to_value`] and [`enum_from_value`].
pub trait MappedEnum: Copy + Default + 'static {
    /// Type name used in error messages and the semantic type.
    const NAME: &'static str;
    /// Integral representation the enumeration is stored as.
    const REPR: IntegralRepr;

    fn discriminant(self) -> i64;

    /// Returns the variant with this discriminant, if one is defined.
    fn from_discriminant(value: i64) -> Option<Self>;
}

pub fn enum_semantic_type<E: MappedEnum>() -> SemanticType {
    SemanticType::required(ValueKind::Enum {
        name: E::NAME,
        repr: E::REPR,
    })
}

/// Stores `raw` at the representation's width, or as `I64` when it does not
/// fit so the value is never truncated.
fn repr_value(repr: IntegralRepr, raw: i64) -> Value {
    let narrowed = match repr {
        IntegralRepr::U8 => u8::try_from(raw).ok().map(Value::U8),
        IntegralRepr::I16 => i16::try_from(raw).ok().map(Value::I16),
        IntegralRepr::I32 => i32::try_from(raw).ok().map(Value::I32),
        IntegralRepr::I64 => Some(Value::I64(raw)),
    };
    narrowed.unwrap_or(Value::I64(raw))
}

fn repr_fits(repr: IntegralRepr, raw: i64) -> bool {
    match repr {
        IntegralRepr::U8 => u8::try_from(raw).is_ok(),
        IntegralRepr::I16 => i16::try_from(raw).is_ok(),
        IntegralRepr::I32 => i32::try_from(raw).is_ok(),
        IntegralRepr::I64 => true,
    }
}

pub fn enum_to_value<E: MappedEnum>(value: E) -> Value {
    repr_value(E::REPR, value.discriminant())
}

/// Reads an enumeration, failing with
/// [`ValueError::UndefinedDiscriminant`] for values naming no variant.
pub fn enum_from_value<E: MappedEnum>(value: Value) -> Result<E, ValueError> {
    match Discriminant::<E>::from_value(value)? {
        Discriminant::Defined(e) => Ok(e),
        Discriminant::Undefined(raw) => Err(ValueError::UndefinedDiscriminant {
            enum_name: E::NAME,
            value: raw,
        }),
    }
}

/// An enumeration member that tolerates undefined stored values.
///
/// Values with no matching variant are kept as the raw integral instead of
/// being defaulted or rejected.
///
/// # Examples
///
/// ```
/// use tablemap_core::{Discriminant, FieldValue, MapEnum, Value};
///
/// #[derive(Debug, Clone, Copy, Default, PartialEq, MapEnum)]
/// #[repr(i32)]
/// enum Status {
///     #[default]
///     Active = 1,
///     Closed = 2,
/// }
///
/// let read = Discriminant::<Status>::from_value(Value::I64(2)).unwrap();
/// assert_eq!(read, Discriminant::Defined(Status::Closed));
///
/// let read = Discriminant::<Status>::from_value(Value::I64(7)).unwrap();
/// assert_eq!(read, Discriminant::Undefined(7));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discriminant<E> {
    Defined(E),
    Undefined(i64),
}

impl<E> Discriminant<E> {
    pub fn defined(self) -> Option<E> {
        match self {
            Discriminant::Defined(e) => Some(e),
            Discriminant::Undefined(_) => None,
        }
    }
}

impl<E: Default> Default for Discriminant<E> {
    fn default() -> Self {
        Discriminant::Defined(E::default())
    }
}

impl<E: MappedEnum> FieldValue for Discriminant<E> {
    fn semantic_type() -> SemanticType {
        enum_semantic_type::<E>()
    }

    fn to_value(&self) -> Value {
        match self {
            Discriminant::Defined(e) => enum_to_value(*e),
            Discriminant::Undefined(raw) => repr_value(E::REPR, *raw),
        }
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        if value.is_null() {
            return Ok(Discriminant::Defined(E::default()));
        }
        let raw = integral(E::NAME, &value)?;
        if !repr_fits(E::REPR, raw) {
            return Err(ValueError::OutOfRange {
                expected: E::NAME,
                value: raw.to_string(),
            });
        }
        Ok(E::from_discriminant(raw).map_or(Discriminant::Undefined(raw), Discriminant::Defined))
    }
}

//! Conversion between mapped values and SQLite storage classes.
//!
//! SQLite stores integers, reals, text and blobs. Wider types are written
//! as:
//!
//! | Value        | Storage                                  |
//! |--------------|------------------------------------------|
//! | `Bool`       | integer `0` / `1`                        |
//! | `Decimal`    | text                                     |
//! | `DateTime`   | text, `YYYY-MM-DD HH:MM:SS.ffffff`       |
//! | `Interval`   | integer microseconds                     |
//! | `Uuid`       | hyphenated text                          |
//! | `Chars`      | text                                     |
//!
//! Reads return the raw storage class; member coercion turns text back into
//! date-times, UUIDs and decimals.

use rusqlite::types::{Value as SqlValue, ValueRef};
use tablemap_core::Value;

use crate::error::{Result, SqliteError};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Converts a bound value into an owned SQLite value.
pub fn to_sql(value: Value) -> Result<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(b)),
        Value::U8(v) => SqlValue::Integer(i64::from(v)),
        Value::I16(v) => SqlValue::Integer(i64::from(v)),
        Value::I32(v) => SqlValue::Integer(i64::from(v)),
        Value::I64(v) => SqlValue::Integer(v),
        Value::F32(v) => SqlValue::Real(f64::from(v)),
        Value::F64(v) => SqlValue::Real(v),
        Value::Decimal(d) => SqlValue::Text(d.to_string()),
        Value::String(s) => SqlValue::Text(s),
        Value::Chars(chars) => SqlValue::Text(chars.into_iter().collect()),
        Value::Bytes(bytes) => SqlValue::Blob(bytes),
        Value::DateTime(dt) => SqlValue::Text(dt.format(DATETIME_FORMAT).to_string()),
        Value::Interval(delta) => {
            let micros = delta.num_microseconds().ok_or_else(|| {
                SqliteError::ConversionError(format!(
                    "interval of {delta} does not fit in 64-bit microseconds"
                ))
            })?;
            SqlValue::Integer(micros)
        }
        Value::Uuid(u) => SqlValue::Text(u.hyphenated().to_string()),
    })
}

/// Copies a column of the current row into a raw value.
pub fn from_sql(value: ValueRef<'_>) -> Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::I64(i),
        ValueRef::Real(f) => Value::F64(f),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|e| SqliteError::ConversionError(format!("text column is not UTF-8: {e}")))?;
            Value::String(text.to_string())
        }
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    })
}

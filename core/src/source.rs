//! Collaborator interfaces: row sources and command sinks.
//!
//! The engine never talks to a database. It reads rows through [`Row`] /
//! [`RowSource`] / [`AsyncRowSource`] and writes parameters through
//! [`CommandSink`]. [`MemoryRows`] and [`ParameterList`] are in-memory
//! implementations for staging data and for tests.

use std::future::Future;

use thiserror::Error;

use crate::convert::FieldValue;
use crate::error::{MapError, Result};
use crate::types::StorageType;
use crate::value::Value;

/// Accessors for the row a source is currently positioned on.
pub trait Row {
    fn field_count(&self) -> usize;

    /// Column name at `index`.
    fn field_name(&self, index: usize) -> &str;

    /// Raw value at `index` in the current row.
    fn value(&self, index: usize) -> Result<Value>;

    /// Raw value of the named column, `None` if no such column exists.
    fn value_by_name(&self, name: &str) -> Result<Option<Value>> {
        match (0..self.field_count()).find(|&i| self.field_name(i) == name) {
            Some(index) => self.value(index).map(Some),
            None => Ok(None),
        }
    }
}

/// A row source advanced by blocking calls.
pub trait RowSource: Row {
    /// Moves to the next row; `false` once the source is exhausted.
    fn advance(&mut self) -> Result<bool>;
}

/// A row source advanced by awaiting.
pub trait AsyncRowSource: Row {
    fn advance(&mut self) -> impl Future<Output = Result<bool>> + Send;
}

impl<R: Row + ?Sized> Row for &mut R {
    fn field_count(&self) -> usize {
        (**self).field_count()
    }

    fn field_name(&self, index: usize) -> &str {
        (**self).field_name(index)
    }

    fn value(&self, index: usize) -> Result<Value> {
        (**self).value(index)
    }

    fn value_by_name(&self, name: &str) -> Result<Option<Value>> {
        (**self).value_by_name(name)
    }
}

impl<S: RowSource + ?Sized> RowSource for &mut S {
    fn advance(&mut self) -> Result<bool> {
        (**self).advance()
    }
}

/// Receiver of named, typed parameters.
pub trait CommandSink {
    /// Attaches a parameter. Absent values arrive as [`Value::Null`].
    fn add_parameter(&mut self, name: &str, storage_type: StorageType, value: Value);

    /// Attaches a typed value, taking the storage type from the type table.
    fn add_value<V: FieldValue>(&mut self, name: &str, value: &V)
    where
        Self: Sized,
    {
        self.add_parameter(name, V::semantic_type().storage_type(), value.to_value());
    }

    /// Attaches a raw value, inferring the storage type from the value.
    fn add_raw(&mut self, name: &str, value: Value) {
        let storage_type = value.storage_type();
        self.add_parameter(name, storage_type, value);
    }
}

/// Failures of a positioned row source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("no current row; advance the source first")]
    NoCurrentRow,
    #[error("column index {index} out of range for {count} columns")]
    ColumnOutOfRange { index: usize, count: usize },
}

/// In-memory row source.
///
/// # Examples
///
/// ```
/// use tablemap_core::{MemoryRows, Row, RowSource, Value};
///
/// let mut rows = MemoryRows::new(["id", "email"])
///     .with_row([Value::I64(1), Value::from("a@example.com")]);
///
/// assert!(rows.advance().unwrap());
/// assert_eq!(rows.value_by_name("email").unwrap(), Some(Value::from("a@example.com")));
/// assert!(!rows.advance().unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRows {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    position: Option<usize>,
}

impl MemoryRows {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            position: None,
        }
    }

    /// Appends a row; missing trailing cells read as `Null`.
    pub fn with_row(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        let mut row: Vec<Value> = values.into_iter().collect();
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
        self
    }

    /// Number of rows held, regardless of position.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn step(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        if next < self.rows.len() {
            self.position = Some(next);
            true
        } else {
            self.position = Some(self.rows.len());
            false
        }
    }
}

impl Row for MemoryRows {
    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn field_name(&self, index: usize) -> &str {
        &self.columns[index]
    }

    fn value(&self, index: usize) -> Result<Value> {
        let row = self
            .position
            .and_then(|p| self.rows.get(p))
            .ok_or_else(|| MapError::from_source(RowError::NoCurrentRow))?;
        row.get(index).cloned().ok_or_else(|| {
            MapError::from_source(RowError::ColumnOutOfRange {
                index,
                count: self.columns.len(),
            })
        })
    }
}

impl RowSource for MemoryRows {
    fn advance(&mut self) -> Result<bool> {
        Ok(self.step())
    }
}

impl AsyncRowSource for MemoryRows {
    fn advance(&mut self) -> impl Future<Output = Result<bool>> + Send {
        let more = self.step();
        std::future::ready(Ok(more))
    }
}

/// A parameter captured by [`ParameterList`].
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub storage_type: StorageType,
    pub value: Value,
}

/// In-memory command sink recording parameters in binding order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterList {
    parameters: Vec<Parameter>,
}

impl ParameterList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    /// Turns the parameters into a one-row source whose columns are the
    /// parameter names.
    pub fn into_rows(self) -> MemoryRows {
        let (columns, values): (Vec<String>, Vec<Value>) =
            self.parameters.into_iter().map(|p| (p.name, p.value)).unzip();
        MemoryRows::new(columns).with_row(values)
    }
}

impl CommandSink for ParameterList {
    fn add_parameter(&mut self, name: &str, storage_type: StorageType, value: Value) {
        self.parameters.push(Parameter {
            name: name.to_string(),
            storage_type,
            value,
        });
    }
}

impl<'a> IntoIterator for &'a ParameterList {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.parameters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_before_advance_fails() {
        let rows = MemoryRows::new(["a"]).with_row([Value::I32(1)]);
        let err = rows.value(0).unwrap_err();
        assert_eq!(err.to_string(), "row source error: no current row; advance the source first");
    }

    #[test]
    fn test_short_rows_are_padded() {
        let mut rows = MemoryRows::new(["a", "b"]).with_row([Value::I32(1)]);
        assert!(RowSource::advance(&mut rows).unwrap());
        assert_eq!(rows.value(1).unwrap(), Value::Null);
        assert_eq!(rows.value_by_name("c").unwrap(), None);
    }

    #[test]
    fn test_exhausted_source_stays_exhausted() {
        let mut rows = MemoryRows::new(["a"]).with_row([Value::I32(1)]);
        assert!(RowSource::advance(&mut rows).unwrap());
        assert!(!RowSource::advance(&mut rows).unwrap());
        assert!(!RowSource::advance(&mut rows).unwrap());
        assert!(rows.value(0).is_err());
    }

    #[test]
    fn test_sink_inference() {
        let mut params = ParameterList::new();
        params.add_value("count", &Some(3i16));
        params.add_value("missing", &None::<String>);
        params.add_raw("flag", Value::Bool(true));

        assert_eq!(params.get("count").unwrap().storage_type, StorageType::Int16);
        let missing = params.get("missing").unwrap();
        assert_eq!(missing.storage_type, StorageType::String);
        assert_eq!(missing.value, Value::Null);
        assert_eq!(params.get("flag").unwrap().storage_type, StorageType::Boolean);
        assert_eq!(params.names(), ["count", "missing", "flag"]);
    }
}

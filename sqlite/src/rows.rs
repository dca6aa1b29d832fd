//! Row source over a prepared statement.

use rusqlite::{Rows, Statement};
use tablemap_core::{MapError, Row, RowError, RowSource, Value};

use crate::convert::from_sql;

/// Reads the rows produced by a statement whose parameters are bound.
///
/// Each advance copies the current row's columns, so the source can be
/// handed to [`Map::create_iter`](tablemap_core::Map::create_iter) like any
/// other row source.
pub struct SqliteRows<'stmt> {
    rows: Rows<'stmt>,
    columns: Vec<String>,
    current: Option<Vec<Value>>,
}

impl<'stmt> SqliteRows<'stmt> {
    /// Starts the query with the parameters already bound on `stmt`.
    pub fn new(stmt: &'stmt mut Statement<'_>) -> Self {
        let columns = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        Self {
            rows: stmt.raw_query(),
            columns,
            current: None,
        }
    }
}

impl Row for SqliteRows<'_> {
    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn field_name(&self, index: usize) -> &str {
        &self.columns[index]
    }

    fn value(&self, index: usize) -> tablemap_core::Result<Value> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| MapError::from_source(RowError::NoCurrentRow))?;
        row.get(index).cloned().ok_or_else(|| {
            MapError::from_source(RowError::ColumnOutOfRange {
                index,
                count: self.columns.len(),
            })
        })
    }
}

impl RowSource for SqliteRows<'_> {
    fn advance(&mut self) -> tablemap_core::Result<bool> {
        let count = self.columns.len();
        match self.rows.next().map_err(MapError::from_source)? {
            Some(row) => {
                let values = (0..count)
                    .map(|index| {
                        let value = row.get_ref(index).map_err(MapError::from_source)?;
                        from_sql(value).map_err(MapError::from_source)
                    })
                    .collect::<tablemap_core::Result<Vec<_>>>()?;
                self.current = Some(values);
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }
}

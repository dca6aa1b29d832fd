//! Command sink binding named parameters onto a prepared statement.

use rusqlite::Statement;
use tablemap_core::{CommandSink, ParameterList, StorageType, Value};
use tracing::{trace, warn};

use crate::convert::to_sql;
use crate::error::{Result, SqliteError};

/// Binds `@name` parameters onto a statement.
///
/// Parameters the statement does not mention are skipped. Values are
/// stored by their own storage class; the storage type is not consulted.
/// The first binding failure is kept and reported by
/// [`finish`](SqliteParams::finish); later parameters are then ignored.
/// Dropping the sink without finishing logs any stored failure.
pub struct SqliteParams<'a, 'conn> {
    stmt: &'a mut Statement<'conn>,
    bound: usize,
    error: Option<SqliteError>,
}

impl<'a, 'conn> SqliteParams<'a, 'conn> {
    pub fn new(stmt: &'a mut Statement<'conn>) -> Self {
        Self {
            stmt,
            bound: 0,
            error: None,
        }
    }

    /// Number of parameters bound so far.
    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Returns the number of bound parameters, or the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first conversion or binding failure.
    #[must_use = "binding failures are only reported through `finish`"]
    pub fn finish(mut self) -> Result<usize> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(self.bound),
        }
    }

    fn bind(&mut self, name: &str, value: Value) -> Result<()> {
        let placeholder = format!("@{name}");
        let Some(index) = self.stmt.parameter_index(&placeholder)? else {
            trace!(parameter = name, "Statement does not use parameter");
            return Ok(());
        };
        self.stmt.raw_bind_parameter(index, to_sql(value)?)?;
        self.bound += 1;
        Ok(())
    }
}

impl CommandSink for SqliteParams<'_, '_> {
    fn add_parameter(&mut self, name: &str, _storage_type: StorageType, value: Value) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.bind(name, value) {
            self.error = Some(err);
        }
    }
}

impl Drop for SqliteParams<'_, '_> {
    fn drop(&mut self) {
        if let Some(err) = &self.error {
            warn!(error = %err, "Parameter sink dropped with an unreported binding failure");
        }
    }
}

/// Binds every staged parameter onto `stmt`.
pub fn bind_list(stmt: &mut Statement<'_>, params: &ParameterList) -> Result<usize> {
    let mut sink = SqliteParams::new(stmt);
    for param in params {
        sink.add_parameter(&param.name, param.storage_type, param.value.clone());
    }
    sink.finish()
}

//! SQLite adapter for `tablemap-core`.
//!
//! This crate connects [`Map`]s to `rusqlite`:
//!
//! - [`SqliteRows`] — a [`RowSource`](tablemap_core::RowSource) over a
//!   prepared statement.
//! - [`SqliteParams`] — a [`CommandSink`](tablemap_core::CommandSink)
//!   binding `@column` parameters onto a prepared statement.
//! - [`query_entities`] / [`execute`] — prepare, bind and run in one call.
//! - [`sqlite_configuration`] — a configuration whose statements end in
//!   `RETURNING *`.
//!
//! SQLite accepts the bracket-quoted identifiers and `@name` parameters
//! the fragments are written with, so map statements run unchanged.
//!
//! # Quick start
//!
//! ```
//! use rusqlite::Connection;
//! use tablemap_core::{Entity, Map, ParameterList};
//! use tablemap_sqlite::{execute, query_entities, sqlite_configuration};
//!
//! #[derive(Debug, Default, PartialEq, Entity)]
//! #[map(table = "notes")]
//! struct Note {
//!     #[map(key)]
//!     id: i64,
//!     body: String,
//! }
//!
//! let conn = Connection::open_in_memory().unwrap();
//! execute(&conn, "CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT NOT NULL)", &ParameterList::new()).unwrap();
//!
//! let map = Map::<Note>::with_configuration(&sqlite_configuration());
//! let note = Note { body: "hello".into(), ..Note::default() };
//!
//! let mut params = ParameterList::new();
//! map.bind_parameters(&note, &mut params, false);
//! let inserted = query_entities(&conn, &map, map.insert_statement(), &params).unwrap();
//!
//! assert_eq!(inserted, [Note { id: 1, body: "hello".into() }]);
//! ```

mod convert;
mod error;
mod params;
mod rows;

use rusqlite::Connection;
use tablemap_core::{Dialect, Entity, Map, MapperConfiguration, ParameterList};
use tracing::debug;

pub use convert::{from_sql, to_sql};
pub use error::{Result, SqliteError};
pub use params::{SqliteParams, bind_list};
pub use rows::SqliteRows;

/// Default configuration with the SQLite dialect.
pub fn sqlite_configuration() -> MapperConfiguration {
    MapperConfiguration::new().with_dialect(Dialect::Sqlite)
}

/// Runs a query and maps every returned row.
pub fn query_entities<T: Entity>(
    conn: &Connection,
    map: &Map<T>,
    sql: &str,
    params: &ParameterList,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    bind_list(&mut stmt, params)?;
    let entities = map.create_all(SqliteRows::new(&mut stmt))?;
    debug!(table = map.table_name(), rows = entities.len(), "Queried entities");
    Ok(entities)
}

/// Runs a statement that returns no rows, returning the changed row count.
pub fn execute(conn: &Connection, sql: &str, params: &ParameterList) -> Result<usize> {
    let mut stmt = conn.prepare(sql)?;
    bind_list(&mut stmt, params)?;
    Ok(stmt.raw_execute()?)
}

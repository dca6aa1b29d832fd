//! Ad hoc filter conditions.
//!
//! [`Conditions`] is an ordered list of column/value pairs rendered as a
//! `WHERE` clause with matching `@column` parameters.
//!
//! # Examples
//!
//! ```
//! use tablemap_core::{Conditions, ParameterList};
//!
//! let conditions = Conditions::new()
//!     .with("Email", "%@example.com")
//!     .with("Active", true);
//!
//! assert_eq!(
//!     conditions.append_to("SELECT * FROM [Users]"),
//!     "SELECT * FROM [Users] WHERE [Email] LIKE @Email AND [Active] = @Active"
//! );
//!
//! let mut params = ParameterList::new();
//! conditions.bind(&mut params);
//! assert_eq!(params.names(), ["Email", "Active"]);
//! ```

use crate::error::Result;
use crate::map::Map;
use crate::source::CommandSink;
use crate::statement::quote_identifier;
use crate::value::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions {
    pairs: Vec<(String, Value)>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a condition on `column`.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.pairs.push((column.into(), value.into()));
    }

    /// A condition on the map's single key column.
    pub fn for_key<T>(map: &Map<T>, value: impl Into<Value>) -> Result<Self> {
        Ok(Self::new().with(map.key_name()?, value))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.pairs.iter().map(|(column, value)| (column.as_str(), value))
    }

    /// `[a] = @a AND [b] LIKE @b`; empty when there are no conditions.
    pub fn where_clause(&self) -> String {
        self.pairs
            .iter()
            .map(|(column, value)| {
                let op = if is_pattern(value) { "LIKE" } else { "=" };
                format!("{} {op} @{column}", quote_identifier(column))
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Appends the clause to `sql`.
    ///
    /// SQL ending in `AND` (any case) is continued directly, SQL that
    /// already has a `WHERE` is extended with `AND`, anything else gets a
    /// new `WHERE`.
    pub fn append_to(&self, sql: &str) -> String {
        if self.is_empty() {
            return sql.to_string();
        }
        let clause = self.where_clause();
        let trimmed = sql.trim_end();
        let upper = trimmed.to_ascii_uppercase();
        if upper.ends_with(" AND") || upper == "AND" {
            format!("{trimmed} {clause}")
        } else if contains_word(&upper, "WHERE") {
            format!("{trimmed} AND {clause}")
        } else {
            format!("{trimmed} WHERE {clause}")
        }
    }

    /// Binds each value under its column name.
    pub fn bind<S: CommandSink + ?Sized>(&self, sink: &mut S) {
        for (column, value) in &self.pairs {
            sink.add_raw(column, value.clone());
        }
    }
}

fn is_pattern(value: &Value) -> bool {
    value.as_str().is_some_and(|s| s.contains('%'))
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .any(|token| token == word)
}

impl<C: Into<String>, V: Into<Value>> FromIterator<(C, V)> for Conditions {
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        let mut conditions = Self::new();
        for (column, value) in iter {
            conditions.push(column, value);
        }
        conditions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ParameterList;
    use crate::types::StorageType;

    #[test]
    fn test_append_modes() {
        let conditions = Conditions::new().with("Id", 5i32);
        assert_eq!(conditions.append_to("SELECT * FROM [T]"), "SELECT * FROM [T] WHERE [Id] = @Id");
        assert_eq!(
            conditions.append_to("SELECT * FROM [T] WHERE [Active] = 1"),
            "SELECT * FROM [T] WHERE [Active] = 1 AND [Id] = @Id"
        );
        assert_eq!(
            conditions.append_to("SELECT * FROM [T] WHERE [Active] = 1 and "),
            "SELECT * FROM [T] WHERE [Active] = 1 and [Id] = @Id"
        );
    }

    #[test]
    fn test_empty_conditions_leave_sql_alone() {
        let conditions = Conditions::new();
        assert_eq!(conditions.where_clause(), "");
        assert_eq!(conditions.append_to("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_where_column_is_not_a_keyword() {
        let conditions = Conditions::new().with("Name", "x");
        assert_eq!(
            conditions.append_to("SELECT [Somewhere] FROM [T]"),
            "SELECT [Somewhere] FROM [T] WHERE [Name] = @Name"
        );
    }

    #[test]
    fn test_bind_infers_storage_type() {
        let conditions: Conditions = [("Name", Value::from("a%")), ("Deleted", Value::Null)]
            .into_iter()
            .collect();
        assert_eq!(conditions.where_clause(), "[Name] LIKE @Name AND [Deleted] = @Deleted");

        let mut params = ParameterList::new();
        conditions.bind(&mut params);
        assert_eq!(params.get("Name").unwrap().storage_type, StorageType::String);
        assert_eq!(params.get("Deleted").unwrap().value, Value::Null);
    }
}

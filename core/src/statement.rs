//! Full statement templates.
//!
//! Statements are assembled from a map's fragments and its bracket-quoted
//! table name. The output clause follows the [`Dialect`]: `OUTPUT
//! INSERTED.*` ahead of `VALUES`/`WHERE` for SQL Server, a trailing
//! `RETURNING *` for SQLite.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::Dialect;

/// The statements a map can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Select,
    Count,
    Insert,
    Update,
    Delete,
}

/// Quotes an identifier with brackets.
pub fn quote_identifier(name: &str) -> String {
    format!("[{name}]")
}

impl Dialect {
    pub fn select(self, table: &str, columns: &str) -> String {
        format!("SELECT {columns} FROM {}", quote_identifier(table))
    }

    pub fn count(self, table: &str) -> String {
        format!("SELECT COUNT(*) FROM {}", quote_identifier(table))
    }

    pub fn insert(self, table: &str, columns: &str, parameters: &str) -> String {
        let table = quote_identifier(table);
        match self {
            Dialect::SqlServer => {
                format!("INSERT INTO {table} ({columns}) OUTPUT INSERTED.* VALUES ({parameters})")
            }
            Dialect::Sqlite => {
                format!("INSERT INTO {table} ({columns}) VALUES ({parameters}) RETURNING *")
            }
        }
    }

    pub fn update(self, table: &str, set_clause: &str, key_where: &str) -> String {
        let table = quote_identifier(table);
        match self {
            Dialect::SqlServer => {
                format!("UPDATE {table} SET {set_clause} OUTPUT INSERTED.* WHERE {key_where}")
            }
            Dialect::Sqlite => {
                format!("UPDATE {table} SET {set_clause} WHERE {key_where} RETURNING *")
            }
        }
    }

    pub fn delete(self, table: &str, key_where: &str) -> String {
        format!("DELETE FROM {} WHERE {key_where}", quote_identifier(table))
    }
}

/// Verbatim statement replacements. They are kept apart from the fragment
/// cache, so reconfiguring a map does not discard them.
#[derive(Debug, Clone, Default)]
pub(crate) struct StatementOverrides {
    statements: HashMap<StatementKind, String>,
}

impl StatementOverrides {
    pub(crate) fn get(&self, kind: StatementKind) -> Option<&str> {
        self.statements.get(&kind).map(String::as_str)
    }

    pub(crate) fn set(&mut self, kind: StatementKind, sql: String) {
        self.statements.insert(kind, sql);
    }

    pub(crate) fn clear(&mut self, kind: StatementKind) -> Option<String> {
        self.statements.remove(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_server_templates() {
        let d = Dialect::SqlServer;
        assert_eq!(d.select("Users", "[Id], [Email]"), "SELECT [Id], [Email] FROM [Users]");
        assert_eq!(d.count("Users"), "SELECT COUNT(*) FROM [Users]");
        assert_eq!(
            d.insert("Users", "[Email]", "@Email"),
            "INSERT INTO [Users] ([Email]) OUTPUT INSERTED.* VALUES (@Email)"
        );
        assert_eq!(
            d.update("Users", "[Email] = @Email", "[Id] = @Id"),
            "UPDATE [Users] SET [Email] = @Email OUTPUT INSERTED.* WHERE [Id] = @Id"
        );
        assert_eq!(d.delete("Users", "[Id] = @Id"), "DELETE FROM [Users] WHERE [Id] = @Id");
    }

    #[test]
    fn test_sqlite_templates() {
        let d = Dialect::Sqlite;
        assert_eq!(
            d.insert("users", "[email]", "@email"),
            "INSERT INTO [users] ([email]) VALUES (@email) RETURNING *"
        );
        assert_eq!(
            d.update("users", "[email] = @email", "[id] = @id"),
            "UPDATE [users] SET [email] = @email WHERE [id] = @id RETURNING *"
        );
    }

    #[test]
    fn test_overrides() {
        let mut overrides = StatementOverrides::default();
        assert_eq!(overrides.get(StatementKind::Count), None);
        overrides.set(StatementKind::Count, "SELECT 1".to_string());
        assert_eq!(overrides.get(StatementKind::Count), Some("SELECT 1"));
        assert_eq!(overrides.clear(StatementKind::Count).as_deref(), Some("SELECT 1"));
        assert_eq!(overrides.get(StatementKind::Count), None);
    }
}

//! SQLite storage handle for the persisted engine
//!
//! [`Database`] owns one connection for its whole lifetime. Foreign keys are
//! switched on when the connection opens, since the directory table refers
//! to itself through its parent column.
//!
//! Statements are built as text by the engine and logged at `trace` level
//! before they run.

use crate::config::StoreConfig;
use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use stemdir_common::Pretty;
use tracing::{debug, trace};

/// What to do with an existing database file on open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpenStyle {
    /// Open the file as it is, creating it if missing.
    #[default]
    OpenExistent,
    /// Delete the file first and start from an empty database.
    RecreateExistent,
}

/// One row of `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub decl_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

/// An open SQLite database.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open a database file.
    pub fn open(path: impl AsRef<Path>, style: OpenStyle) -> Result<Self> {
        let path = path.as_ref();
        if style == OpenStyle::RecreateExistent && path.exists() {
            debug!("Recreating database {}", path.display());
            std::fs::remove_file(path)?;
        }

        let conn = Connection::open(path)?;
        debug!("Opened database {}", path.display());
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Open the database a [`StoreConfig`] describes.
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        debug!("Opening store with configuration:{}", Pretty(config));

        let db = Self::open(&config.database_path, config.open_style)?;
        if let Some(mode) = &config.journal_mode {
            db.conn.pragma_update(None, "journal_mode", mode)?;
        }
        Ok(db)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self { conn })
    }

    /// The underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run one statement, returning the number of rows changed.
    pub fn execute(&self, sql: &str) -> Result<usize> {
        trace!("{}", sql);
        Ok(self.conn.execute(sql, [])?)
    }

    /// Create `table` with the given column definitions unless it exists.
    pub fn create_table_if_not_exists(&self, table: &str, defs: &str) -> Result<()> {
        let sql = format!("CREATE TABLE IF NOT EXISTS [{}] (\n{}\n)", table, defs);
        trace!("{}", sql);
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let count: usize = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Number of rows of `table` matching `predicate`.
    pub fn count(&self, table: &str, predicate: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM [{}] WHERE {}", table, predicate);
        trace!("{}", sql);
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    /// First column of the first row as an integer, or `null_value` when the
    /// query yields no row or NULL.
    pub fn query_int(&self, sql: &str, null_value: i64) -> Result<i64> {
        Ok(self.query_opt_int(sql)?.unwrap_or(null_value))
    }

    /// First column of the first row as an integer, if any.
    pub fn query_opt_int(&self, sql: &str) -> Result<Option<i64>> {
        let value = self.query_row(sql, |row| row.get::<_, Option<i64>>(0))?;
        Ok(value.flatten())
    }

    /// First column of the first row as text, if any.
    pub fn query_string(&self, sql: &str) -> Result<Option<String>> {
        let value = self.query_row(sql, |row| row.get::<_, Option<String>>(0))?;
        Ok(value.flatten())
    }

    /// Map the first row of a query, or `None` if it yields no rows.
    pub fn query_row<R>(
        &self,
        sql: &str,
        map: impl FnOnce(&Row<'_>) -> rusqlite::Result<R>,
    ) -> Result<Option<R>> {
        trace!("{}", sql);
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.query_row([], map).optional()?)
    }

    /// Column layout of `table`, in declaration order.
    pub fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info([{}])", table))?;
        let rows = stmt.query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get("name")?,
                decl_type: row.get("type")?,
                not_null: row.get::<_, i64>("notnull")? != 0,
                default_value: row.get("dflt_value")?,
                primary_key: row.get::<_, i64>("pk")? != 0,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Run `body` inside one transaction.
    ///
    /// Commits when `body` returns `Ok`; any error rolls every statement of
    /// the body back. Must not be nested.
    pub fn transaction<R>(&self, body: impl FnOnce(&Self) -> Result<R>) -> Result<R> {
        let tx = self.conn.unchecked_transaction()?;
        let result = body(self)?;
        tx.commit()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirError;
    use tempfile::TempDir;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_table_if_not_exists("Things", "    [Id] INTEGER PRIMARY KEY,\n    [Label] TEXT")
            .unwrap();
        db
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = setup_db();
        let on = db.query_int("PRAGMA foreign_keys", 0).unwrap();
        assert_eq!(on, 1);
    }

    #[test]
    fn test_table_exists_and_count() {
        let db = setup_db();
        assert!(db.table_exists("Things").unwrap());
        assert!(!db.table_exists("Other").unwrap());

        db.execute("INSERT INTO [Things] ([Label]) VALUES ('a')").unwrap();
        db.execute("INSERT INTO [Things] ([Label]) VALUES ('b')").unwrap();
        assert_eq!(db.count("Things", "1 = 1").unwrap(), 2);
        assert_eq!(db.count("Things", "[Label] = 'b'").unwrap(), 1);
    }

    #[test]
    fn test_scalar_queries() {
        let db = setup_db();
        assert_eq!(db.query_int("SELECT MAX([Id]) FROM [Things]", -1).unwrap(), -1);
        assert_eq!(db.query_opt_int("SELECT [Id] FROM [Things]").unwrap(), None);

        db.execute("INSERT INTO [Things] ([Id], [Label]) VALUES (7, 'x')").unwrap();
        assert_eq!(db.query_int("SELECT MAX([Id]) FROM [Things]", -1).unwrap(), 7);
        assert_eq!(
            db.query_string("SELECT [Label] FROM [Things] WHERE [Id] = 7")
                .unwrap()
                .as_deref(),
            Some("x")
        );
    }

    #[test]
    fn test_columns() {
        let db = setup_db();
        let columns = db.columns("Things").unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Label"]);
        assert!(columns[0].primary_key);
        assert_eq!(columns[1].decl_type, "TEXT");
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = setup_db();
        let result: Result<()> = db.transaction(|db| {
            db.execute("INSERT INTO [Things] ([Label]) VALUES ('kept?')")?;
            Err(DirError::invalid_operation("abort"))
        });
        assert!(result.is_err());
        assert_eq!(db.count("Things", "1 = 1").unwrap(), 0);

        db.transaction(|db| db.execute("INSERT INTO [Things] ([Label]) VALUES ('kept')"))
            .unwrap();
        assert_eq!(db.count("Things", "1 = 1").unwrap(), 1);
    }

    #[test]
    fn test_recreate_existent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.db");
        {
            let db = Database::open(&path, OpenStyle::OpenExistent).unwrap();
            db.create_table_if_not_exists("Things", "    [Id] INTEGER PRIMARY KEY")
                .unwrap();
        }
        {
            let db = Database::open(&path, OpenStyle::OpenExistent).unwrap();
            assert!(db.table_exists("Things").unwrap());
        }
        let db = Database::open(&path, OpenStyle::RecreateExistent).unwrap();
        assert!(!db.table_exists("Things").unwrap());
    }
}

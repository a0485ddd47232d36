//! SQLite-backed record backend.
//!
//! # Responsibility
//! - Persist store keys as rows of `kv_entries`.
//!
//! # Invariants
//! - Only connections migrated to `latest_version()` are accepted.
//! - `set` is an upsert; one row per key.

use super::{BackendResult, RecordBackend};
use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};

/// Durable kv storage over a borrowed connection.
pub struct SqliteBackend<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBackend<'conn> {
    /// Wraps a connection opened by `db::open_db` / `db::open_db_in_memory`.
    ///
    /// # Errors
    /// - `DbError::SchemaNotMigrated` when the schema is behind this build.
    pub fn try_new(conn: &'conn Connection) -> BackendResult<Self> {
        let db_version = current_version(conn)?;
        let expected = latest_version();
        if db_version != expected {
            return Err(DbError::SchemaNotMigrated {
                db_version,
                expected,
            }
            .into());
        }
        Ok(Self { conn })
    }

    /// Sum of stored value sizes in bytes.
    pub fn stored_bytes(&self) -> BackendResult<u64> {
        let total = self.conn.query_row(
            "SELECT COALESCE(SUM(value_bytes), 0) FROM kv_entries;",
            [],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(u64::try_from(total).unwrap_or_default())
    }
}

impl RecordBackend for SqliteBackend<'_> {
    fn get(&self, key: &str) -> BackendResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> BackendResult<()> {
        let value_bytes = i64::try_from(value.len()).unwrap_or(i64::MAX);
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, value_bytes, updated_at)
             VALUES (?1, ?2, ?3, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                value_bytes = excluded.value_bytes,
                updated_at = excluded.updated_at;",
            params![key, value, value_bytes],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteBackend;
    use crate::backend::{BackendError, RecordBackend};
    use crate::db::{open_db_in_memory, DbError};
    use rusqlite::Connection;

    #[test]
    fn set_upserts_single_row() {
        let conn = open_db_in_memory().unwrap();
        let backend = SqliteBackend::try_new(&conn).unwrap();

        backend.set("persons", "[]").unwrap();
        backend.set("persons", "[{}]").unwrap();

        assert_eq!(backend.get("persons").unwrap().as_deref(), Some("[{}]"));
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM kv_entries;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(backend.stored_bytes().unwrap(), 4);
    }

    #[test]
    fn try_new_rejects_unmigrated_connection() {
        let conn = Connection::open_in_memory().unwrap();
        let err = SqliteBackend::try_new(&conn).err().unwrap();
        assert!(matches!(
            err,
            BackendError::Db(DbError::SchemaNotMigrated { db_version: 0, .. })
        ));
    }
}

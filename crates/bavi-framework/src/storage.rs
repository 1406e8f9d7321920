//! Shared SQLite storage handed to plugins.
//!
//! The dispatch core never looks inside: each plugin creates and owns its
//! own tables during init. Access is serialized by the handle's mutex and
//! nothing more.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::StorageError;

/// A cloneable handle to the bot's database.
#[derive(Clone)]
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "Opened storage");
        Ok(Self::from_connection(conn))
    }

    /// Opens a private in-memory database.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        debug!("Opened in-memory storage");
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `f` with exclusive access to the connection.
    ///
    /// ```rust,ignore
    /// let zone: Option<String> = storage.with_connection(|conn| {
    ///     conn.query_row("SELECT tz FROM tz_info WHERE nick = ?1", [nick], |row| row.get(0))
    ///         .optional()
    /// })?;
    /// ```
    pub fn with_connection<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T>,
    {
        let mut conn = self.conn.lock();
        Ok(f(&mut conn)?)
    }

    /// Installs triggers that stamp `created_at` on insert and `updated_at`
    /// on update.
    ///
    /// The table must already have both columns. Existing triggers with the
    /// same names are left alone.
    pub fn create_audit_triggers(&self, table: &str, primary_key: &str) -> Result<(), StorageError> {
        check_identifier(table)?;
        check_identifier(primary_key)?;

        let sql = format!(
            "CREATE TRIGGER IF NOT EXISTS {table}_insert_audit AFTER INSERT ON {table}
             BEGIN
                 UPDATE {table} SET created_at = datetime('now'), updated_at = datetime('now')
                 WHERE {primary_key} = NEW.{primary_key};
             END;
             CREATE TRIGGER IF NOT EXISTS {table}_update_audit AFTER UPDATE ON {table}
             WHEN NEW.updated_at IS OLD.updated_at
             BEGIN
                 UPDATE {table} SET updated_at = datetime('now')
                 WHERE {primary_key} = NEW.{primary_key};
             END;"
        );

        self.with_connection(|conn| conn.execute_batch(&sql))?;
        debug!(table, "Installed audit triggers");
        Ok(())
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

fn check_identifier(name: &str) -> Result<(), StorageError> {
    let valid = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidIdentifier(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::OptionalExtension;

    fn audited_table(storage: &Storage) {
        storage
            .with_connection(|conn| {
                conn.execute_batch(
                    "CREATE TABLE notes (
                         id INTEGER PRIMARY KEY,
                         body TEXT NOT NULL,
                         created_at TEXT,
                         updated_at TEXT
                     )",
                )
            })
            .unwrap();
        storage.create_audit_triggers("notes", "id").unwrap();
    }

    #[test]
    fn test_round_trip() {
        let storage = Storage::in_memory().unwrap();
        storage
            .with_connection(|conn| {
                conn.execute_batch("CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT)")?;
                conn.execute("INSERT INTO kv VALUES (?1, ?2)", ["a", "1"])?;
                Ok(())
            })
            .unwrap();

        let clone = storage.clone();
        let v: Option<String> = clone
            .with_connection(|conn| {
                conn.query_row("SELECT v FROM kv WHERE k = ?1", ["a"], |row| row.get(0))
                    .optional()
            })
            .unwrap();
        assert_eq!(v.as_deref(), Some("1"));
    }

    #[test]
    fn test_audit_triggers_stamp_rows() {
        let storage = Storage::in_memory().unwrap();
        audited_table(&storage);

        let (created, updated): (Option<String>, Option<String>) = storage
            .with_connection(|conn| {
                conn.execute("INSERT INTO notes (body) VALUES ('hi')", [])?;
                conn.execute("UPDATE notes SET body = 'bye' WHERE id = 1", [])?;
                conn.query_row(
                    "SELECT created_at, updated_at FROM notes WHERE id = 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
            })
            .unwrap();
        assert!(created.is_some());
        assert!(updated.is_some());
    }

    #[test]
    fn test_audit_triggers_are_idempotent() {
        let storage = Storage::in_memory().unwrap();
        audited_table(&storage);
        storage.create_audit_triggers("notes", "id").unwrap();
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        let storage = Storage::in_memory().unwrap();
        assert!(matches!(
            storage.create_audit_triggers("notes; DROP TABLE x", "id"),
            Err(StorageError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            storage.create_audit_triggers("notes", ""),
            Err(StorageError::InvalidIdentifier(_))
        ));
    }
}

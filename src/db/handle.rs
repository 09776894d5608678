//! Shared connection handle.
//!
//! `rusqlite::Connection` is `Send` but not `Sync`; the document store and
//! the credential store share one connection behind a mutex.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;

pub struct DbHandle {
    conn: Mutex<Connection>,
}

impl DbHandle {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Open (or create) a file-backed database and run migrations.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::new(open_database(path)?))
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::new(open_memory_database()?))
    }

    /// Run `f` with exclusive access to the connection.
    pub fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let guard = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::count_tables;

    #[test]
    fn in_memory_handle_is_migrated() {
        let db = DbHandle::open_in_memory().unwrap();
        let tables = db.with_conn(count_tables).unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn errors_from_closure_propagate() {
        let db = DbHandle::open_in_memory().unwrap();
        let result: Result<(), _> = db.with_conn(|_| {
            Err(DatabaseError::ConstraintViolation("boom".into()))
        });
        assert!(matches!(result, Err(DatabaseError::ConstraintViolation(_))));
    }
}

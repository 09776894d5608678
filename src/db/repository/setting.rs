use rusqlite::{params, Connection};

use crate::db::DatabaseError;

/// Get a setting by key. Returns None if not set.
pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
    match stmt.query_row([key], |row| row.get::<_, String>(0)) {
        Ok(val) => Ok(Some(val)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DatabaseError::from(e)),
    }
}

/// Set a setting (upsert).
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO settings (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

/// Write several settings atomically.
pub fn set_settings(conn: &Connection, entries: &[(&str, &str)]) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    for (key, value) in entries {
        set_setting(&tx, key, value)?;
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn missing_setting_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_setting(&conn, "icd_access_token").unwrap().is_none());
    }

    #[test]
    fn set_then_overwrite() {
        let conn = open_memory_database().unwrap();
        set_setting(&conn, "k", "one").unwrap();
        set_setting(&conn, "k", "two").unwrap();
        assert_eq!(get_setting(&conn, "k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn batch_write_sets_all_entries() {
        let conn = open_memory_database().unwrap();
        set_settings(&conn, &[("a", "1"), ("b", "2")]).unwrap();
        assert_eq!(get_setting(&conn, "a").unwrap().as_deref(), Some("1"));
        assert_eq!(get_setting(&conn, "b").unwrap().as_deref(), Some("2"));
    }
}

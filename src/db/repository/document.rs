use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;

/// A raw document row: JSON body plus store-assigned metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub collection: String,
    pub id: String,
    pub body: String,
    /// Epoch millis, assigned on insert.
    pub created_at: i64,
    /// Epoch millis, bumped on every replace.
    pub updated_at: i64,
}

pub fn insert_document(
    conn: &Connection,
    collection: &str,
    id: &str,
    body: &str,
    now_millis: i64,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (collection, id, body, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![collection, id, body, now_millis],
    )?;
    Ok(())
}

/// Overwrite the body of an existing document. Fails with `NotFound`
/// when no such document exists (no upsert).
pub fn replace_document(
    conn: &Connection,
    collection: &str,
    id: &str,
    body: &str,
    now_millis: i64,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "UPDATE documents SET body = ?3, updated_at = ?4
         WHERE collection = ?1 AND id = ?2",
        params![collection, id, body, now_millis],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: collection.to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn get_document(
    conn: &Connection,
    collection: &str,
    id: &str,
) -> Result<Option<StoredDocument>, DatabaseError> {
    conn.query_row(
        "SELECT collection, id, body, created_at, updated_at
         FROM documents WHERE collection = ?1 AND id = ?2",
        params![collection, id],
        row_to_document,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// All documents of one collection. Order is unspecified; callers sort.
pub fn list_documents(
    conn: &Connection,
    collection: &str,
) -> Result<Vec<StoredDocument>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT collection, id, body, created_at, updated_at
         FROM documents WHERE collection = ?1",
    )?;
    let rows = stmt.query_map(params![collection], row_to_document)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DatabaseError::from)
}

pub fn delete_document(
    conn: &Connection,
    collection: &str,
    id: &str,
) -> Result<(), DatabaseError> {
    let affected = conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
        params![collection, id],
    )?;
    if affected == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: collection.to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Delete every document whose collection is `prefix` or nested below it.
/// Returns the number of removed documents.
pub fn delete_collection_tree(conn: &Connection, prefix: &str) -> Result<usize, DatabaseError> {
    let nested = format!("{prefix}/");
    let affected = conn.execute(
        "DELETE FROM documents
         WHERE collection = ?1 OR substr(collection, 1, length(?2)) = ?2",
        params![prefix, nested],
    )?;
    Ok(affected)
}

fn row_to_document(row: &rusqlite::Row) -> Result<StoredDocument, rusqlite::Error> {
    Ok(StoredDocument {
        collection: row.get(0)?,
        id: row.get(1)?,
        body: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let conn = test_db();
        insert_document(&conn, "patients", "p1", r#"{"first_name":"Ana"}"#, 1_000).unwrap();

        let doc = get_document(&conn, "patients", "p1").unwrap().unwrap();
        assert_eq!(doc.body, r#"{"first_name":"Ana"}"#);
        assert_eq!(doc.created_at, 1_000);
        assert_eq!(doc.updated_at, 1_000);
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = test_db();
        assert!(get_document(&conn, "patients", "nope").unwrap().is_none());
    }

    #[test]
    fn replace_bumps_updated_at_only() {
        let conn = test_db();
        insert_document(&conn, "patients", "p1", "{}", 1_000).unwrap();
        replace_document(&conn, "patients", "p1", r#"{"x":1}"#, 2_000).unwrap();

        let doc = get_document(&conn, "patients", "p1").unwrap().unwrap();
        assert_eq!(doc.body, r#"{"x":1}"#);
        assert_eq!(doc.created_at, 1_000);
        assert_eq!(doc.updated_at, 2_000);
    }

    #[test]
    fn replace_missing_is_not_found() {
        let conn = test_db();
        let result = replace_document(&conn, "patients", "ghost", "{}", 1);
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn delete_missing_is_not_found() {
        let conn = test_db();
        let result = delete_document(&conn, "patients", "ghost");
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn list_is_scoped_to_collection() {
        let conn = test_db();
        insert_document(&conn, "patients/a/allergies", "1", "{}", 1).unwrap();
        insert_document(&conn, "patients/a/allergies", "2", "{}", 1).unwrap();
        insert_document(&conn, "patients/b/allergies", "3", "{}", 1).unwrap();

        assert_eq!(list_documents(&conn, "patients/a/allergies").unwrap().len(), 2);
        assert_eq!(list_documents(&conn, "patients/b/allergies").unwrap().len(), 1);
    }

    #[test]
    fn collection_tree_delete_spares_siblings() {
        let conn = test_db();
        insert_document(&conn, "patients/a/allergies", "1", "{}", 1).unwrap();
        insert_document(&conn, "patients/a/vaccines", "2", "{}", 1).unwrap();
        insert_document(&conn, "patients/ab/vaccines", "3", "{}", 1).unwrap();

        let removed = delete_collection_tree(&conn, "patients/a").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(list_documents(&conn, "patients/ab/vaccines").unwrap().len(), 1);
    }
}

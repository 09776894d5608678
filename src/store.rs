//! Document store: schemaless JSON documents grouped in collections.
//!
//! Collections are slash-separated paths. Patients live in `patients`,
//! their records in `patients/{patient_id}/{collection}`. Document ids are
//! generated by the store on insert (UUID v4); bodies never carry them.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::db::{self, DatabaseError, DbHandle};

/// Root collection for patient documents.
pub const PATIENTS_COLLECTION: &str = "patients";

/// A document as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Operations the repositories need from a document database.
pub trait DocumentStore: Send + Sync {
    /// Insert `body` under a freshly generated id and return that id.
    fn add(&self, collection: &str, body: &Value) -> Result<String, DatabaseError>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DatabaseError>;

    /// All documents of a collection, in no particular order.
    fn list(&self, collection: &str) -> Result<Vec<Document>, DatabaseError>;

    /// Overwrite an existing document. `NotFound` if it does not exist.
    fn replace(&self, collection: &str, id: &str, body: &Value) -> Result<(), DatabaseError>;

    /// `NotFound` if it does not exist.
    fn delete(&self, collection: &str, id: &str) -> Result<(), DatabaseError>;

    /// Delete one document and the collection tree under it in a single
    /// transaction. `NotFound` (and nothing removed) if the document does
    /// not exist. Returns the number of nested documents removed.
    fn delete_with_tree(
        &self,
        collection: &str,
        id: &str,
        tree: &str,
    ) -> Result<usize, DatabaseError>;
}

/// Path of a patient's record subcollection.
pub fn record_collection(patient_id: &str, collection: &str) -> String {
    format!("{PATIENTS_COLLECTION}/{patient_id}/{collection}")
}

/// Path prefix holding every subcollection of a patient.
pub fn patient_tree(patient_id: &str) -> String {
    format!("{PATIENTS_COLLECTION}/{patient_id}")
}

/// Reject ids that would escape their collection path.
pub fn validate_id(kind: &str, id: &str) -> Result<(), DatabaseError> {
    if id.trim().is_empty() {
        return Err(DatabaseError::ConstraintViolation(format!("{kind} id is empty")));
    }
    if id.contains('/') {
        return Err(DatabaseError::ConstraintViolation(format!(
            "{kind} id contains '/': {id}"
        )));
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════
// SQLite-backed store
// ═══════════════════════════════════════════════════════════

pub struct SqliteDocumentStore {
    db: Arc<DbHandle>,
}

impl SqliteDocumentStore {
    pub fn new(db: Arc<DbHandle>) -> Self {
        Self { db }
    }

    fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn add(&self, collection: &str, body: &Value) -> Result<String, DatabaseError> {
        let id = Uuid::new_v4().to_string();
        let json = serde_json::to_string(body)?;
        self.db.with_conn(|conn| {
            db::insert_document(conn, collection, &id, &json, Self::now_millis())
        })?;
        tracing::info!(collection, id = %id, "Document created");
        Ok(id)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, DatabaseError> {
        let stored = self
            .db
            .with_conn(|conn| db::get_document(conn, collection, id))?;
        stored.map(to_document).transpose()
    }

    fn list(&self, collection: &str) -> Result<Vec<Document>, DatabaseError> {
        let stored = self
            .db
            .with_conn(|conn| db::list_documents(conn, collection))?;
        stored.into_iter().map(to_document).collect()
    }

    fn replace(&self, collection: &str, id: &str, body: &Value) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(body)?;
        self.db.with_conn(|conn| {
            db::replace_document(conn, collection, id, &json, Self::now_millis())
        })?;
        tracing::info!(collection, id, "Document updated");
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), DatabaseError> {
        self.db
            .with_conn(|conn| db::delete_document(conn, collection, id))?;
        tracing::info!(collection, id, "Document deleted");
        Ok(())
    }

    fn delete_with_tree(
        &self,
        collection: &str,
        id: &str,
        tree: &str,
    ) -> Result<usize, DatabaseError> {
        let removed = self.db.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            let removed = db::delete_collection_tree(&tx, tree)?;
            db::delete_document(&tx, collection, id)?;
            tx.commit()?;
            Ok(removed)
        })?;
        tracing::info!(collection, id, removed, "Document and tree deleted");
        Ok(removed)
    }
}

fn to_document(stored: db::StoredDocument) -> Result<Document, DatabaseError> {
    Ok(Document {
        body: serde_json::from_str(&stored.body)?,
        id: stored.id,
        created_at: stored.created_at,
        updated_at: stored.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_store() -> SqliteDocumentStore {
        SqliteDocumentStore::new(Arc::new(DbHandle::open_in_memory().unwrap()))
    }

    #[test]
    fn add_assigns_unique_ids() {
        let store = test_store();
        let a = store.add("patients", &json!({"n": 1})).unwrap();
        let b = store.add("patients", &json!({"n": 2})).unwrap();
        assert!(!a.is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn add_then_get_returns_body() {
        let store = test_store();
        let id = store.add("patients", &json!({"first_name": "Ana"})).unwrap();
        let doc = store.get("patients", &id).unwrap().unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.body["first_name"], "Ana");
        assert!(doc.created_at > 0);
    }

    #[test]
    fn replace_and_delete() {
        let store = test_store();
        let id = store.add("patients", &json!({"v": 1})).unwrap();
        store.replace("patients", &id, &json!({"v": 2})).unwrap();
        assert_eq!(store.get("patients", &id).unwrap().unwrap().body["v"], 2);

        store.delete("patients", &id).unwrap();
        assert!(store.get("patients", &id).unwrap().is_none());
    }

    #[test]
    fn delete_with_tree_removes_patient_and_subcollections() {
        let store = test_store();
        let id = store.add(PATIENTS_COLLECTION, &json!({})).unwrap();
        let other = store.add(PATIENTS_COLLECTION, &json!({})).unwrap();
        store.add(&record_collection(&id, "allergies"), &json!({})).unwrap();
        store.add(&record_collection(&id, "vaccines"), &json!({})).unwrap();
        store.add(&record_collection(&other, "vaccines"), &json!({})).unwrap();

        let removed = store
            .delete_with_tree(PATIENTS_COLLECTION, &id, &patient_tree(&id))
            .unwrap();
        assert_eq!(removed, 2);
        assert!(store.get(PATIENTS_COLLECTION, &id).unwrap().is_none());
        assert!(store.list(&record_collection(&id, "allergies")).unwrap().is_empty());
        assert_eq!(store.list(&record_collection(&other, "vaccines")).unwrap().len(), 1);
        assert!(store.get(PATIENTS_COLLECTION, &other).unwrap().is_some());
    }

    #[test]
    fn delete_with_tree_rolls_back_when_document_missing() {
        let store = test_store();
        store.add(&record_collection("p1", "allergies"), &json!({})).unwrap();

        let err = store
            .delete_with_tree(PATIENTS_COLLECTION, "p1", &patient_tree("p1"))
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
        assert_eq!(store.list(&record_collection("p1", "allergies")).unwrap().len(), 1);
    }

    #[test]
    fn validate_id_rejects_empty_and_slashes() {
        assert!(validate_id("patient", "").is_err());
        assert!(validate_id("patient", "  ").is_err());
        assert!(validate_id("patient", "a/b").is_err());
        assert!(validate_id("patient", "abc-123").is_ok());
    }

    #[test]
    fn collection_paths() {
        assert_eq!(record_collection("p1", "allergies"), "patients/p1/allergies");
        assert_eq!(patient_tree("p1"), "patients/p1");
    }
}

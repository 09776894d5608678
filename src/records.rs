//! Per-patient record repositories.
//!
//! `RecordRepository<T>` is the typed CRUD surface over one record
//! subcollection. `RecordRegistry` erases the type so the HTTP layer can
//! dispatch on a `RecordKind` taken from the URL.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::db::DatabaseError;
use crate::error::AppError;
use crate::history::group_by_date;
use crate::models::{
    Allergy, BloodGlucose, BloodPressure, Examination, Laboratory, MedicalAppointment,
    MedicalRecord, OxygenSaturation, Prescription, Radiology, RecordKind, Vaccine,
};
use crate::store::{record_collection, validate_id, Document, DocumentStore, PATIENTS_COLLECTION};

pub struct RecordRepository<T> {
    store: Arc<dyn DocumentStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for RecordRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: MedicalRecord> RecordRepository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    fn collection(patient_id: &str) -> Result<String, AppError> {
        validate_id("patient", patient_id)?;
        Ok(record_collection(patient_id, T::KIND.collection()))
    }

    /// All records of the patient, newest first.
    pub fn list(&self, patient_id: &str) -> Result<Vec<T>, AppError> {
        let collection = Self::collection(patient_id)?;
        let mut records = self
            .store
            .list(&collection)?
            .into_iter()
            .map(|doc| {
                let created_at = doc.created_at;
                decode::<T>(doc).map(|record| (record, created_at))
            })
            .collect::<Result<Vec<_>, _>>()?;

        records.sort_by_key(|(record, created_at)| Reverse((record.occurred_at(), *created_at)));
        Ok(records.into_iter().map(|(record, _)| record).collect())
    }

    pub fn get(&self, patient_id: &str, record_id: &str) -> Result<Option<T>, AppError> {
        let collection = Self::collection(patient_id)?;
        validate_id(T::KIND.collection(), record_id)?;
        match self.store.get(&collection, record_id)? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    /// Most recent record, if any.
    pub fn latest(&self, patient_id: &str) -> Result<Option<T>, AppError> {
        Ok(self.list(patient_id)?.into_iter().next())
    }

    /// Store a new record and return its generated id. Any id already set
    /// on `record` is ignored.
    pub fn add(&self, patient_id: &str, record: &T) -> Result<String, AppError> {
        let collection = Self::collection(patient_id)?;
        record
            .validate()
            .map_err(|reason| AppError::validation(T::KIND.collection(), reason))?;
        if self.store.get(PATIENTS_COLLECTION, patient_id)?.is_none() {
            return Err(DatabaseError::NotFound {
                entity_type: PATIENTS_COLLECTION.into(),
                id: patient_id.into(),
            }
            .into());
        }

        let id = self.store.add(&collection, &encode(record)?)?;
        tracing::info!(kind = %T::KIND, patient_id, id = %id, "Record added");
        Ok(id)
    }

    /// Overwrite the stored record whose id is `record.id()`.
    pub fn update(&self, patient_id: &str, record: &T) -> Result<(), AppError> {
        let collection = Self::collection(patient_id)?;
        if record.id().trim().is_empty() {
            return Err(AppError::validation(
                T::KIND.collection(),
                "cannot update a record without an id",
            ));
        }
        validate_id(T::KIND.collection(), record.id())?;
        record
            .validate()
            .map_err(|reason| AppError::validation(T::KIND.collection(), reason))?;

        self.store.replace(&collection, record.id(), &encode(record)?)?;
        tracing::info!(kind = %T::KIND, patient_id, id = record.id(), "Record updated");
        Ok(())
    }

    pub fn delete(&self, patient_id: &str, record_id: &str) -> Result<(), AppError> {
        let collection = Self::collection(patient_id)?;
        validate_id(T::KIND.collection(), record_id)?;
        self.store.delete(&collection, record_id)?;
        tracing::info!(kind = %T::KIND, patient_id, id = record_id, "Record deleted");
        Ok(())
    }
}

/// Body as stored: the record without its id.
fn encode<T: MedicalRecord>(record: &T) -> Result<Value, AppError> {
    let mut body = serde_json::to_value(record).map_err(DatabaseError::from)?;
    if let Value::Object(map) = &mut body {
        map.remove("id");
    }
    Ok(body)
}

fn decode<T: MedicalRecord>(doc: Document) -> Result<T, AppError> {
    let mut record: T = serde_json::from_value(doc.body).map_err(DatabaseError::from)?;
    record.set_id(doc.id);
    Ok(record)
}

// ═══════════════════════════════════════════════════════════
// Type-erased access for the HTTP layer
// ═══════════════════════════════════════════════════════════

/// JSON-in, JSON-out view of a `RecordRepository`.
pub trait RecordsJson: Send + Sync {
    fn list(&self, patient_id: &str) -> Result<Value, AppError>;

    fn history(&self, patient_id: &str) -> Result<Value, AppError>;

    fn get(&self, patient_id: &str, record_id: &str) -> Result<Option<Value>, AppError>;

    fn add(&self, patient_id: &str, body: Value) -> Result<Value, AppError>;

    /// `record_id` from the path wins over any id in the body.
    fn update(&self, patient_id: &str, record_id: &str, body: Value) -> Result<Value, AppError>;

    fn delete(&self, patient_id: &str, record_id: &str) -> Result<(), AppError>;
}

fn parse_body<T: MedicalRecord>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body)
        .map_err(|e| AppError::validation(T::KIND.collection(), e.to_string()))
}

fn to_json<S: serde::Serialize>(value: &S) -> Result<Value, AppError> {
    Ok(serde_json::to_value(value).map_err(DatabaseError::from)?)
}

impl<T: MedicalRecord> RecordsJson for RecordRepository<T> {
    fn list(&self, patient_id: &str) -> Result<Value, AppError> {
        to_json(&RecordRepository::<T>::list(self, patient_id)?)
    }

    fn history(&self, patient_id: &str) -> Result<Value, AppError> {
        let records = RecordRepository::<T>::list(self, patient_id)?;
        to_json(&group_by_date(records))
    }

    fn get(&self, patient_id: &str, record_id: &str) -> Result<Option<Value>, AppError> {
        RecordRepository::<T>::get(self, patient_id, record_id)?
            .map(|record| to_json(&record))
            .transpose()
    }

    fn add(&self, patient_id: &str, body: Value) -> Result<Value, AppError> {
        let mut record = parse_body::<T>(body)?;
        let id = RecordRepository::<T>::add(self, patient_id, &record)?;
        record.set_id(id);
        to_json(&record)
    }

    fn update(&self, patient_id: &str, record_id: &str, body: Value) -> Result<Value, AppError> {
        let mut record = parse_body::<T>(body)?;
        record.set_id(record_id.to_string());
        RecordRepository::<T>::update(self, patient_id, &record)?;
        to_json(&record)
    }

    fn delete(&self, patient_id: &str, record_id: &str) -> Result<(), AppError> {
        RecordRepository::<T>::delete(self, patient_id, record_id)
    }
}

/// One repository per record kind.
#[derive(Clone)]
pub struct RecordRegistry {
    repositories: HashMap<RecordKind, Arc<dyn RecordsJson>>,
}

impl RecordRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        fn entry<T: MedicalRecord>(store: &Arc<dyn DocumentStore>) -> (RecordKind, Arc<dyn RecordsJson>) {
            (T::KIND, Arc::new(RecordRepository::<T>::new(store.clone())))
        }

        let repositories = HashMap::from([
            entry::<Allergy>(&store),
            entry::<Vaccine>(&store),
            entry::<BloodPressure>(&store),
            entry::<BloodGlucose>(&store),
            entry::<OxygenSaturation>(&store),
            entry::<Examination>(&store),
            entry::<Laboratory>(&store),
            entry::<Prescription>(&store),
            entry::<MedicalAppointment>(&store),
            entry::<Radiology>(&store),
        ]);
        Self { repositories }
    }

    pub fn get(&self, kind: RecordKind) -> Option<&Arc<dyn RecordsJson>> {
        self.repositories.get(&kind)
    }
}

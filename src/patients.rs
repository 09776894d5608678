use std::sync::Arc;

use serde_json::Value;

use crate::db::DatabaseError;
use crate::error::AppError;
use crate::models::{Disease, Patient};
use crate::store::{patient_tree, validate_id, Document, DocumentStore, PATIENTS_COLLECTION};

/// CRUD over the `patients` collection.
#[derive(Clone)]
pub struct PatientRepository {
    store: Arc<dyn DocumentStore>,
}

impl PatientRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// All patients, by last name then first name (case-insensitive).
    pub fn list(&self) -> Result<Vec<Patient>, AppError> {
        let mut patients = self
            .store
            .list(PATIENTS_COLLECTION)?
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<_>, _>>()?;
        patients.sort_by_cached_key(|p| {
            (
                p.last_name.trim().to_lowercase(),
                p.first_name.trim().to_lowercase(),
            )
        });
        Ok(patients)
    }

    /// Patients whose full name contains `text`. Blank text lists all.
    pub fn search(&self, text: &str) -> Result<Vec<Patient>, AppError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|p| p.matches(text))
            .collect())
    }

    pub fn get(&self, id: &str) -> Result<Option<Patient>, AppError> {
        validate_id("patient", id)?;
        self.store
            .get(PATIENTS_COLLECTION, id)?
            .map(decode)
            .transpose()
    }

    fn require(&self, id: &str) -> Result<Patient, AppError> {
        self.get(id)?.ok_or_else(|| {
            DatabaseError::NotFound {
                entity_type: PATIENTS_COLLECTION.into(),
                id: id.into(),
            }
            .into()
        })
    }

    pub fn add(&self, patient: &Patient) -> Result<String, AppError> {
        patient
            .validate()
            .map_err(|reason| AppError::validation("patient", reason))?;
        let id = self.store.add(PATIENTS_COLLECTION, &encode(patient)?)?;
        tracing::info!(id = %id, "Patient added");
        Ok(id)
    }

    /// Overwrite demographics. The stored diagnosis is kept; it changes
    /// only through `set_disease` and `clear_disease`.
    pub fn update(&self, patient: &Patient) -> Result<Patient, AppError> {
        if patient.id.trim().is_empty() {
            return Err(AppError::validation(
                "patient",
                "cannot update a patient without an id",
            ));
        }
        validate_id("patient", &patient.id)?;
        patient
            .validate()
            .map_err(|reason| AppError::validation("patient", reason))?;
        let stored = self.require(&patient.id)?;
        let updated = Patient {
            disease: stored.disease,
            ..patient.clone()
        };
        self.store
            .replace(PATIENTS_COLLECTION, &updated.id, &encode(&updated)?)?;
        tracing::info!(id = %updated.id, "Patient updated");
        Ok(updated)
    }

    /// Delete the patient and every record filed under it.
    pub fn delete(&self, id: &str) -> Result<(), AppError> {
        validate_id("patient", id)?;
        let removed = self
            .store
            .delete_with_tree(PATIENTS_COLLECTION, id, &patient_tree(id))?;
        tracing::info!(id, removed_records = removed, "Patient deleted");
        Ok(())
    }

    /// Attach a diagnosis picked from the disease search.
    pub fn set_disease(&self, id: &str, disease: &Disease) -> Result<Patient, AppError> {
        let mut patient = self.require(id)?;
        patient.disease = Some(disease.to_ref());
        self.store
            .replace(PATIENTS_COLLECTION, id, &encode(&patient)?)?;
        tracing::info!(id, code = disease.code.as_deref().unwrap_or(""), "Diagnosis set");
        Ok(patient)
    }

    pub fn clear_disease(&self, id: &str) -> Result<Patient, AppError> {
        let mut patient = self.require(id)?;
        patient.disease = None;
        self.store
            .replace(PATIENTS_COLLECTION, id, &encode(&patient)?)?;
        tracing::info!(id, "Diagnosis cleared");
        Ok(patient)
    }
}

fn encode(patient: &Patient) -> Result<Value, AppError> {
    let mut body = serde_json::to_value(patient).map_err(DatabaseError::from)?;
    if let Value::Object(map) = &mut body {
        map.remove("id");
    }
    Ok(body)
}

fn decode(doc: Document) -> Result<Patient, AppError> {
    let mut patient: Patient = serde_json::from_value(doc.body).map_err(DatabaseError::from)?;
    patient.id = doc.id;
    Ok(patient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbHandle;
    use crate::models::{Allergy, AllergySeverity, Sex};
    use crate::records::RecordRepository;
    use crate::store::SqliteDocumentStore;
    use chrono::NaiveDate;

    fn test_store() -> Arc<dyn DocumentStore> {
        Arc::new(SqliteDocumentStore::new(Arc::new(
            DbHandle::open_in_memory().unwrap(),
        )))
    }

    fn patient(first: &str, last: &str) -> Patient {
        Patient {
            id: String::new(),
            first_name: first.into(),
            last_name: last.into(),
            birth_date: NaiveDate::from_ymd_opt(1975, 3, 2),
            sex: Some(Sex::Male),
            phone: None,
            email: None,
            address: None,
            blood_type: None,
            disease: None,
            notes: String::new(),
        }
    }

    fn diabetes() -> Disease {
        Disease {
            id: "http://id.who.int/icd/entity/119724091".into(),
            title: "Type 2 diabetes mellitus".into(),
            code: Some("5A11".into()),
            is_leaf: true,
            chapter: Some("05".into()),
            stem_id: None,
            descendants: vec![],
            synonyms: vec![],
        }
    }

    #[test]
    fn add_then_get() {
        let repo = PatientRepository::new(test_store());
        let id = repo.add(&patient("Ana", "Lopez")).unwrap();

        let stored = repo.get(&id).unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.full_name(), "Ana Lopez");
    }

    #[test]
    fn list_sorted_by_last_then_first_name() {
        let repo = PatientRepository::new(test_store());
        repo.add(&patient("Zoe", "Adams")).unwrap();
        repo.add(&patient("Carlos", "mendez")).unwrap();
        repo.add(&patient("Ana", "Mendez")).unwrap();

        let names: Vec<_> = repo.list().unwrap().iter().map(Patient::full_name).collect();
        assert_eq!(names, vec!["Zoe Adams", "Ana Mendez", "Carlos mendez"]);
    }

    #[test]
    fn search_matches_substring() {
        let repo = PatientRepository::new(test_store());
        repo.add(&patient("Ana", "Lopez")).unwrap();
        repo.add(&patient("Bruno", "Diaz")).unwrap();

        let found = repo.search("LOP").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_name, "Ana");
        assert_eq!(repo.search("").unwrap().len(), 2);
    }

    #[test]
    fn update_requires_id_and_existing_patient() {
        let repo = PatientRepository::new(test_store());
        assert!(matches!(
            repo.update(&patient("Ana", "Lopez")).unwrap_err(),
            AppError::Validation { .. }
        ));

        let mut ghost = patient("Ana", "Lopez");
        ghost.id = "missing".into();
        assert!(matches!(
            repo.update(&ghost).unwrap_err(),
            AppError::Database(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn update_persists_changes() {
        let repo = PatientRepository::new(test_store());
        let id = repo.add(&patient("Ana", "Lopez")).unwrap();

        let mut p = repo.get(&id).unwrap().unwrap();
        p.phone = Some("555-0101".into());
        repo.update(&p).unwrap();

        assert_eq!(repo.get(&id).unwrap().unwrap().phone.as_deref(), Some("555-0101"));
    }

    #[test]
    fn update_keeps_stored_diagnosis() {
        let repo = PatientRepository::new(test_store());
        let id = repo.add(&patient("Ana", "Lopez")).unwrap();
        repo.set_disease(&id, &diabetes()).unwrap();

        let mut edited = patient("Ana", "Lopez-Diaz");
        edited.id = id.clone();
        let updated = repo.update(&edited).unwrap();

        assert_eq!(updated.disease.as_ref().unwrap().code, "5A11");
        let stored = repo.get(&id).unwrap().unwrap();
        assert_eq!(stored.last_name, "Lopez-Diaz");
        assert_eq!(stored.disease.unwrap().code, "5A11");
    }

    #[test]
    fn blank_name_is_rejected() {
        let repo = PatientRepository::new(test_store());
        let err = repo.add(&patient("", "Lopez")).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn delete_cascades_to_records() {
        let store = test_store();
        let repo = PatientRepository::new(store.clone());
        let allergies = RecordRepository::<Allergy>::new(store);

        let id = repo.add(&patient("Ana", "Lopez")).unwrap();
        allergies
            .add(
                &id,
                &Allergy {
                    id: String::new(),
                    allergen: "Penicillin".into(),
                    reaction: "Hives".into(),
                    severity: AllergySeverity::Severe,
                    date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                    notes: String::new(),
                },
            )
            .unwrap();

        repo.delete(&id).unwrap();

        assert!(repo.get(&id).unwrap().is_none());
        assert!(allergies.list(&id).unwrap().is_empty());
    }

    #[test]
    fn delete_missing_is_not_found() {
        let repo = PatientRepository::new(test_store());
        assert!(matches!(
            repo.delete("missing").unwrap_err(),
            AppError::Database(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn set_and_clear_disease() {
        let repo = PatientRepository::new(test_store());
        let id = repo.add(&patient("Ana", "Lopez")).unwrap();

        let updated = repo.set_disease(&id, &diabetes()).unwrap();
        assert_eq!(updated.disease.as_ref().unwrap().code, "5A11");
        assert_eq!(
            repo.get(&id).unwrap().unwrap().disease.unwrap().label(),
            "5A11 Type 2 diabetes mellitus"
        );

        repo.clear_disease(&id).unwrap();
        assert!(repo.get(&id).unwrap().unwrap().disease.is_none());
    }

    #[test]
    fn set_disease_on_missing_patient_is_not_found() {
        let repo = PatientRepository::new(test_store());
        let err = repo.set_disease("missing", &diabetes()).unwrap_err();
        assert!(matches!(err, AppError::Database(DatabaseError::NotFound { .. })));
    }
}

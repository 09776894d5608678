use std::sync::Arc;

use serde::Deserialize;

use crate::api::error::ApiError;
use crate::icd::DiseaseSearch;
use crate::models::RecordKind;
use crate::patients::PatientRepository;
use crate::records::{RecordRegistry, RecordsJson};
use crate::store::DocumentStore;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiContext {
    pub patients: PatientRepository,
    pub records: RecordRegistry,
    pub diseases: Arc<dyn DiseaseSearch>,
    /// Default `Accept-Language` for disease searches.
    pub language: String,
}

impl ApiContext {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        diseases: Arc<dyn DiseaseSearch>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            patients: PatientRepository::new(store.clone()),
            records: RecordRegistry::new(store),
            diseases,
            language: language.into(),
        }
    }

    /// Repository for the `:kind` path segment.
    pub fn records_for(&self, kind: &str) -> Result<Arc<dyn RecordsJson>, ApiError> {
        RecordKind::from_collection(kind)
            .and_then(|k| self.records.get(k).cloned())
            .ok_or_else(|| ApiError::NotFound(format!("Unknown record type: {kind}")))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PatientQuery {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DiseaseQuery {
    #[serde(default)]
    pub q: String,
    pub lang: Option<String>,
    pub chapter: Option<String>,
}

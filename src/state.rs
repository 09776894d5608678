//! Tri-state view models.
//!
//! Each operation publishes `Loading` and then `Success` or `Error` on a
//! watch channel. Screens subscribe and render whatever state is current;
//! `reset_*` puts a state back to `Idle` once its outcome has been shown.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::error::{run_blocking, AppError};
use crate::history::{group_by_date, HistoryGroup};
use crate::icd::DiseaseSearch;
use crate::models::{Disease, MedicalRecord, Patient};
use crate::patients::PatientRepository;
use crate::records::RecordRepository;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum UiState<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> Default for UiState<T> {
    fn default() -> Self {
        UiState::Idle
    }
}

impl<T> UiState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, UiState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, UiState::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            UiState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            UiState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// One observable state slot.
pub struct StateCell<T> {
    tx: watch::Sender<UiState<T>>,
}

impl<T: Clone> StateCell<T> {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(UiState::Idle);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<UiState<T>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> UiState<T> {
        self.tx.borrow().clone()
    }

    fn set(&self, state: UiState<T>) {
        self.tx.send_replace(state);
    }

    pub fn reset(&self) {
        self.set(UiState::Idle);
    }

    fn begin(&self) {
        self.set(UiState::Loading);
    }

    /// Publish the outcome and hand it back to the caller.
    fn finish(&self, result: Result<T, AppError>) -> UiState<T> {
        let state = match result {
            Ok(value) => UiState::Success(value),
            Err(e) => {
                tracing::warn!(error = %e, "Operation failed");
                UiState::Error(e.user_message())
            }
        };
        self.set(state.clone());
        state
    }
}

impl<T: Clone> Default for StateCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════

/// List, save and delete states for one record kind of one patient.
pub struct RecordsViewModel<T: MedicalRecord> {
    repo: RecordRepository<T>,
    patient_id: String,
    pub list: StateCell<Vec<T>>,
    /// Id of the saved record.
    pub save: StateCell<String>,
    pub delete: StateCell<()>,
}

impl<T: MedicalRecord> RecordsViewModel<T> {
    pub fn new(repo: RecordRepository<T>, patient_id: impl Into<String>) -> Self {
        Self {
            repo,
            patient_id: patient_id.into(),
            list: StateCell::new(),
            save: StateCell::new(),
            delete: StateCell::new(),
        }
    }

    pub async fn load(&self) -> UiState<Vec<T>> {
        self.list.begin();
        let repo = self.repo.clone();
        let patient_id = self.patient_id.clone();
        self.list
            .finish(run_blocking(move || repo.list(&patient_id)).await)
    }

    /// Add when the record has no id yet, update otherwise. The list is
    /// reloaded after a successful save.
    pub async fn save(&self, record: T) -> UiState<String> {
        self.save.begin();
        let repo = self.repo.clone();
        let patient_id = self.patient_id.clone();
        let result = run_blocking(move || {
            if record.id().is_empty() {
                repo.add(&patient_id, &record)
            } else {
                repo.update(&patient_id, &record)?;
                Ok(record.id().to_string())
            }
        })
        .await;

        let state = self.save.finish(result);
        if state.success().is_some() {
            self.load().await;
        }
        state
    }

    pub async fn delete(&self, record_id: &str) -> UiState<()> {
        self.delete.begin();
        let repo = self.repo.clone();
        let patient_id = self.patient_id.clone();
        let record_id = record_id.to_string();
        let state = self
            .delete
            .finish(run_blocking(move || repo.delete(&patient_id, &record_id)).await);
        if state.success().is_some() {
            self.load().await;
        }
        state
    }

    /// Date buckets of the last loaded list; empty unless it loaded.
    pub fn history(&self) -> Vec<HistoryGroup<T>> {
        match self.list.current() {
            UiState::Success(records) => group_by_date(records),
            _ => Vec::new(),
        }
    }

    pub fn reset_list(&self) {
        self.list.reset();
    }

    pub fn reset_save(&self) {
        self.save.reset();
    }

    pub fn reset_delete(&self) {
        self.delete.reset();
    }
}

// ═══════════════════════════════════════════════════════════
// Patients
// ═══════════════════════════════════════════════════════════

pub struct PatientsViewModel {
    repo: PatientRepository,
    filter: watch::Sender<String>,
    pub list: StateCell<Vec<Patient>>,
    pub save: StateCell<String>,
    pub delete: StateCell<()>,
    /// Patient after a diagnosis was attached or cleared.
    pub disease: StateCell<Patient>,
}

impl PatientsViewModel {
    pub fn new(repo: PatientRepository) -> Self {
        let (filter, _rx) = watch::channel(String::new());
        Self {
            repo,
            filter,
            list: StateCell::new(),
            save: StateCell::new(),
            delete: StateCell::new(),
            disease: StateCell::new(),
        }
    }

    pub fn filter(&self) -> String {
        self.filter.borrow().clone()
    }

    /// Change the name filter and reload.
    pub async fn set_filter(&self, text: &str) -> UiState<Vec<Patient>> {
        self.filter.send_replace(text.trim().to_string());
        self.load().await
    }

    pub async fn load(&self) -> UiState<Vec<Patient>> {
        self.list.begin();
        let repo = self.repo.clone();
        let filter = self.filter();
        self.list
            .finish(run_blocking(move || repo.search(&filter)).await)
    }

    pub async fn save(&self, patient: Patient) -> UiState<String> {
        self.save.begin();
        let repo = self.repo.clone();
        let result = run_blocking(move || {
            if patient.id.is_empty() {
                repo.add(&patient)
            } else {
                Ok(repo.update(&patient)?.id)
            }
        })
        .await;

        let state = self.save.finish(result);
        if state.success().is_some() {
            self.load().await;
        }
        state
    }

    pub async fn delete(&self, patient_id: &str) -> UiState<()> {
        self.delete.begin();
        let repo = self.repo.clone();
        let patient_id = patient_id.to_string();
        let state = self
            .delete
            .finish(run_blocking(move || repo.delete(&patient_id)).await);
        if state.success().is_some() {
            self.load().await;
        }
        state
    }

    pub async fn select_disease(&self, patient_id: &str, disease: Disease) -> UiState<Patient> {
        self.disease.begin();
        let repo = self.repo.clone();
        let patient_id = patient_id.to_string();
        self.disease
            .finish(run_blocking(move || repo.set_disease(&patient_id, &disease)).await)
    }

    pub async fn clear_disease(&self, patient_id: &str) -> UiState<Patient> {
        self.disease.begin();
        let repo = self.repo.clone();
        let patient_id = patient_id.to_string();
        self.disease
            .finish(run_blocking(move || repo.clear_disease(&patient_id)).await)
    }

    pub fn reset_list(&self) {
        self.list.reset();
    }

    pub fn reset_save(&self) {
        self.save.reset();
    }

    pub fn reset_delete(&self) {
        self.delete.reset();
    }

    pub fn reset_disease(&self) {
        self.disease.reset();
    }
}

// ═══════════════════════════════════════════════════════════
// Disease search
// ═══════════════════════════════════════════════════════════

pub struct DiseaseSearchViewModel {
    search: Arc<dyn DiseaseSearch>,
    language: String,
    chapter_filter: String,
    pub results: StateCell<Vec<Disease>>,
}

impl DiseaseSearchViewModel {
    pub fn new(search: Arc<dyn DiseaseSearch>, language: impl Into<String>) -> Self {
        Self {
            search,
            language: language.into(),
            chapter_filter: String::new(),
            results: StateCell::new(),
        }
    }

    /// Restrict results to `;`-separated ICD chapters.
    pub fn with_chapter_filter(mut self, chapters: impl Into<String>) -> Self {
        self.chapter_filter = chapters.into();
        self
    }

    /// A blank query succeeds with no results and no request.
    pub async fn search(&self, query: &str) -> UiState<Vec<Disease>> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return self.results.finish(Ok(Vec::new()));
        }

        self.results.begin();
        let search = self.search.clone();
        let language = self.language.clone();
        let chapters = self.chapter_filter.clone();
        self.results.finish(
            run_blocking(move || {
                search
                    .search(&query, &language, &chapters)
                    .map_err(AppError::from)
            })
            .await,
        )
    }

    pub fn reset(&self) {
        self.results.reset();
    }
}

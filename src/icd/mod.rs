//! ICD-11 disease lookup.
//!
//! `IcdClient` issues authenticated searches against the WHO ICD API using
//! a token from `CredentialCache`. Each call is one HTTP round trip: no
//! pagination, no caching, no retry.

pub mod client;
pub mod types;

pub use client::IcdClient;

use thiserror::Error;

use crate::credential::CredentialError;
use crate::models::Disease;

#[derive(Error, Debug)]
pub enum IcdError {
    #[error("Authentication failed: {0}")]
    Credential(#[from] CredentialError),

    #[error("ICD API is not reachable at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("ICD API rejected the access token")]
    Unauthorized,

    #[error("ICD API returned error (status {status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("ICD search failed: {0}")]
    SearchFailed(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),
}

/// Disease search against a classification service.
pub trait DiseaseSearch: Send + Sync {
    /// Free-text search. `chapter_filter` is a `;`-separated chapter list,
    /// empty for no filter.
    fn search(
        &self,
        query: &str,
        language: &str,
        chapter_filter: &str,
    ) -> Result<Vec<Disease>, IcdError>;
}

/// Fixed result set, for tests and offline runs.
pub struct StaticDiseaseSearch {
    diseases: Vec<Disease>,
}

impl StaticDiseaseSearch {
    pub fn new(diseases: Vec<Disease>) -> Self {
        Self { diseases }
    }
}

impl DiseaseSearch for StaticDiseaseSearch {
    fn search(
        &self,
        query: &str,
        _language: &str,
        chapter_filter: &str,
    ) -> Result<Vec<Disease>, IcdError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let chapters: Vec<&str> = chapter_filter
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .collect();
        Ok(self
            .diseases
            .iter()
            .filter(|d| d.title.to_lowercase().contains(&needle))
            .filter(|d| {
                chapters.is_empty()
                    || d.chapter.as_deref().is_some_and(|c| chapters.contains(&c))
            })
            .cloned()
            .collect())
    }
}

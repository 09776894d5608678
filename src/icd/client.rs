use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION};
use reqwest::StatusCode;

use super::types::SearchResponse;
use super::{DiseaseSearch, IcdError};
use crate::credential::CredentialCache;
use crate::models::Disease;

/// Header selecting the ICD API contract version.
pub const API_VERSION_HEADER: &str = "API-Version";

/// ICD API HTTP client for disease search.
pub struct IcdClient {
    search_url: String,
    api_version: String,
    client: reqwest::blocking::Client,
    credentials: Arc<CredentialCache>,
}

impl IcdClient {
    pub fn new(
        search_url: &str,
        api_version: &str,
        credentials: Arc<CredentialCache>,
        timeout: Duration,
    ) -> Result<Self, IcdError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IcdError::HttpClient(e.to_string()))?;

        Ok(Self {
            search_url: search_url.trim_end_matches('/').to_string(),
            api_version: api_version.to_string(),
            client,
            credentials,
        })
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

impl DiseaseSearch for IcdClient {
    fn search(
        &self,
        query: &str,
        language: &str,
        chapter_filter: &str,
    ) -> Result<Vec<Disease>, IcdError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let token = self.credentials.get_token()?;

        let mut params = vec![
            ("q", query),
            ("useFlexisearch", "false"),
            ("flatResults", "true"),
        ];
        let chapter_filter = chapter_filter.trim();
        if !chapter_filter.is_empty() {
            params.push(("chapterFilter", chapter_filter));
        }

        let response = self
            .client
            .get(&self.search_url)
            .query(&params)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json")
            .header(ACCEPT_LANGUAGE, language)
            .header(API_VERSION_HEADER, &self.api_version)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    IcdError::Connection(self.search_url.clone())
                } else {
                    IcdError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("ICD API rejected bearer token, invalidating cache");
            self.credentials.invalidate()?;
            return Err(IcdError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(IcdError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .map_err(|e| IcdError::HttpClient(e.to_string()))?;
        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| IcdError::ResponseParsing(e.to_string()))?;

        if parsed.error {
            return Err(IcdError::SearchFailed(
                parsed
                    .error_message
                    .unwrap_or_else(|| "unspecified error".to_string()),
            ));
        }

        let diseases = parsed.into_diseases();
        tracing::info!(results = diseases.len(), chapter_filter, "ICD search completed");
        Ok(diseases)
    }
}

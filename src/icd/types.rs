//! Wire types for the ICD API search endpoint and their mapping to `Disease`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::models::Disease;

/// Body of `GET .../search`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub error: bool,
    pub error_message: Option<String>,
    #[serde(default)]
    pub destination_entities: Vec<DestinationEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationEntity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub the_code: Option<String>,
    #[serde(default)]
    pub is_leaf: bool,
    pub chapter: Option<String>,
    pub stem_id: Option<String>,
    #[serde(default)]
    pub descendants: Vec<DestinationEntity>,
    #[serde(default, rename = "matchingPVs")]
    pub matching_pvs: Vec<MatchingPropertyValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchingPropertyValue {
    pub property_id: Option<String>,
    #[serde(default)]
    pub label: String,
}

impl SearchResponse {
    /// Project every well-formed entity; entities without id or title are dropped.
    pub fn into_diseases(self) -> Vec<Disease> {
        let total = self.destination_entities.len();
        let diseases: Vec<Disease> = self
            .destination_entities
            .into_iter()
            .filter_map(DestinationEntity::into_disease)
            .collect();
        if diseases.len() < total {
            tracing::debug!(
                dropped = total - diseases.len(),
                "ICD search entities without id or title skipped"
            );
        }
        diseases
    }
}

impl DestinationEntity {
    fn into_disease(self) -> Option<Disease> {
        let id = self.id.trim().to_string();
        let title = strip_markup(&self.title);
        if id.is_empty() || title.is_empty() {
            return None;
        }

        let mut synonyms: Vec<String> = Vec::new();
        for pv in &self.matching_pvs {
            if pv.property_id.as_deref() != Some("Synonym") {
                continue;
            }
            let label = strip_markup(&pv.label);
            if !label.is_empty() && label != title && !synonyms.contains(&label) {
                synonyms.push(label);
            }
        }

        Some(Disease {
            id,
            title,
            code: self.the_code.filter(|c| !c.trim().is_empty()),
            is_leaf: self.is_leaf,
            chapter: self.chapter.filter(|c| !c.trim().is_empty()),
            stem_id: self.stem_id.filter(|s| !s.trim().is_empty()),
            descendants: self
                .descendants
                .into_iter()
                .map(|d| d.id)
                .filter(|id| !id.is_empty())
                .collect(),
            synonyms,
        })
    }
}

/// Remove HTML tags (the API highlights matches with
/// `<em class='found'>...</em>`) and trim whitespace.
pub fn strip_markup(text: &str) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
    TAG_RE.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "destinationEntities": [
            {
                "id": "http://id.who.int/icd/release/11/2024-01/mms/1697306310",
                "title": "<em class='found'>Diabet</em>es mellitus, type 2",
                "stemId": "http://id.who.int/icd/entity/1697306310",
                "isLeaf": false,
                "theCode": "5A11",
                "chapter": "05",
                "matchingPVs": [
                    {"propertyId": "Synonym", "label": "adult-onset <em class='found'>diabet</em>es", "score": 0.9},
                    {"propertyId": "IndexTerm", "label": "NIDDM", "score": 0.5}
                ],
                "descendants": []
            },
            {
                "id": "",
                "title": "orphan entry"
            }
        ],
        "error": false,
        "errorMessage": null,
        "resultChopped": false
    }"#;

    #[test]
    fn strips_highlight_markup() {
        assert_eq!(strip_markup("<em class='found'>Diabet</em>es"), "Diabetes");
        assert_eq!(strip_markup("  plain  "), "plain");
    }

    #[test]
    fn unclosed_angle_bracket_keeps_text() {
        assert_eq!(
            strip_markup("Glucose < 70 mg/dL hypoglycaemia"),
            "Glucose < 70 mg/dL hypoglycaemia"
        );
        assert_eq!(
            strip_markup("<em class='found'>Glucose</em> < 70 mg/dL"),
            "Glucose < 70 mg/dL"
        );
    }

    #[test]
    fn maps_entities_to_diseases() {
        let response: SearchResponse = serde_json::from_str(SAMPLE).unwrap();
        let diseases = response.into_diseases();

        assert_eq!(diseases.len(), 1);
        let d = &diseases[0];
        assert_eq!(d.title, "Diabetes mellitus, type 2");
        assert_eq!(d.code.as_deref(), Some("5A11"));
        assert_eq!(d.chapter.as_deref(), Some("05"));
        assert!(!d.is_leaf);
        assert_eq!(d.synonyms, vec!["adult-onset diabetes".to_string()]);
    }

    #[test]
    fn empty_code_becomes_none() {
        let json = r#"{"destinationEntities":[{"id":"x","title":"Block","theCode":""}]}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.into_diseases()[0].code, None);
    }

    #[test]
    fn error_flag_is_read() {
        let json = r#"{"error": true, "errorMessage": "Invalid query"}"#;
        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert!(response.error);
        assert_eq!(response.error_message.as_deref(), Some("Invalid query"));
        assert!(response.destination_entities.is_empty());
    }
}

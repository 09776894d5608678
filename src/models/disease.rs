use serde::{Deserialize, Serialize};

/// Read-only projection of an ICD-11 classification entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    /// Entity URI, e.g. `http://id.who.int/icd/entity/119724091`.
    pub id: String,
    /// Title with search-highlight markup removed.
    pub title: String,
    /// MMS code such as `5A11`; absent for chapters and blocks.
    pub code: Option<String>,
    pub is_leaf: bool,
    pub chapter: Option<String>,
    pub stem_id: Option<String>,
    #[serde(default)]
    pub descendants: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

impl Disease {
    /// The reference denormalized onto a patient when selected.
    pub fn to_ref(&self) -> DiseaseRef {
        DiseaseRef {
            id: self.id.clone(),
            code: self.code.clone().unwrap_or_default(),
            title: self.title.clone(),
        }
    }
}

/// Disease reference stored on a patient document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseRef {
    pub id: String,
    pub code: String,
    pub title: String,
}

impl DiseaseRef {
    /// "5A11 Type 2 diabetes mellitus", or just the title when uncoded.
    pub fn label(&self) -> String {
        if self.code.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.code, self.title)
        }
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{require_text, MedicalRecord, RecordKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Radiology {
    #[serde(default)]
    pub id: String,
    /// Modality and protocol, e.g. "Chest X-ray PA".
    pub study_type: String,
    pub body_region: String,
    pub findings: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

impl MedicalRecord for Radiology {
    const KIND: RecordKind = RecordKind::Radiology;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn validate(&self) -> Result<(), String> {
        require_text("study_type", &self.study_type)
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{require_text, MedicalRecord, RecordKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    #[serde(default)]
    pub id: String,
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

impl MedicalRecord for Prescription {
    const KIND: RecordKind = RecordKind::Prescription;

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
        require_text("medication", &self.medication)?;
        require_text("dosage", &self.dosage)
    }
}

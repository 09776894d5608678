use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{require_text, MedicalRecord, RecordKind};

/// Physical examination performed during a visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Examination {
    #[serde(default)]
    pub id: String,
    pub reason: String,
    pub findings: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

impl MedicalRecord for Examination {
    const KIND: RecordKind = RecordKind::Examination;

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
        require_text("reason", &self.reason)
    }
}

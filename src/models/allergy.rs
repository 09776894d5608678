use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::AllergySeverity;
use super::record::{require_text, MedicalRecord, RecordKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allergy {
    #[serde(default)]
    pub id: String,
    pub allergen: String,
    pub reaction: String,
    pub severity: AllergySeverity,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

impl MedicalRecord for Allergy {
    const KIND: RecordKind = RecordKind::Allergy;

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
        require_text("allergen", &self.allergen)
    }
}

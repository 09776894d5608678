use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{require_text, MedicalRecord, RecordKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Laboratory {
    #[serde(default)]
    pub id: String,
    pub test_name: String,
    /// Free text: numeric values and qualitative results ("negative") alike.
    pub result: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

impl MedicalRecord for Laboratory {
    const KIND: RecordKind = RecordKind::Laboratory;

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
        require_text("test_name", &self.test_name)?;
        require_text("result", &self.result)
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{require_text, MedicalRecord, RecordKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vaccine {
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// 1-based position in the vaccination schedule.
    pub dose_number: u32,
    pub lot_number: Option<String>,
    pub administered_by: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
}

impl MedicalRecord for Vaccine {
    const KIND: RecordKind = RecordKind::Vaccine;

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
        require_text("name", &self.name)?;
        if self.dose_number == 0 {
            return Err("dose_number starts at 1".into());
        }
        Ok(())
    }
}

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;
use super::record::{require_text, MedicalRecord, RecordKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalAppointment {
    #[serde(default)]
    pub id: String,
    pub reason: String,
    pub location: Option<String>,
    pub status: AppointmentStatus,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub notes: String,
}

impl MedicalAppointment {
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.status == AppointmentStatus::Scheduled && self.date >= today
    }
}

impl MedicalRecord for MedicalAppointment {
    const KIND: RecordKind = RecordKind::Appointment;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn date(&self) -> NaiveDate {
        self.date
    }

    fn time(&self) -> Option<NaiveTime> {
        Some(self.time)
    }

    fn validate(&self) -> Result<(), String> {
        require_text("reason", &self.reason)
    }
}

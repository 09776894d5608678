use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The record types kept per patient. Each maps to one subcollection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Allergy,
    Vaccine,
    BloodPressure,
    BloodGlucose,
    OxygenSaturation,
    Examination,
    Laboratory,
    Prescription,
    Appointment,
    Radiology,
}

impl RecordKind {
    pub const ALL: [RecordKind; 10] = [
        RecordKind::Allergy,
        RecordKind::Vaccine,
        RecordKind::BloodPressure,
        RecordKind::BloodGlucose,
        RecordKind::OxygenSaturation,
        RecordKind::Examination,
        RecordKind::Laboratory,
        RecordKind::Prescription,
        RecordKind::Appointment,
        RecordKind::Radiology,
    ];

    /// Subcollection name under `patients/{id}/`.
    pub fn collection(self) -> &'static str {
        match self {
            RecordKind::Allergy => "allergies",
            RecordKind::Vaccine => "vaccines",
            RecordKind::BloodPressure => "blood_pressure",
            RecordKind::BloodGlucose => "blood_glucose",
            RecordKind::OxygenSaturation => "oxygen_saturation",
            RecordKind::Examination => "examinations",
            RecordKind::Laboratory => "laboratories",
            RecordKind::Prescription => "prescriptions",
            RecordKind::Appointment => "appointments",
            RecordKind::Radiology => "radiology",
        }
    }

    pub fn from_collection(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.collection() == s)
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection())
    }
}

/// Common surface of every per-patient record.
///
/// `id` is empty until the store assigns one; it is never part of the
/// stored body.
pub trait MedicalRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: RecordKind;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn date(&self) -> NaiveDate;

    fn time(&self) -> Option<NaiveTime> {
        None
    }

    /// Sort key; records without a time sort as midnight.
    fn occurred_at(&self) -> NaiveDateTime {
        self.date().and_time(self.time().unwrap_or(NaiveTime::MIN))
    }

    /// Field-level plausibility checks run before every write.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Shared helper: a required text field must not be blank.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{field} is required"))
    } else {
        Ok(())
    }
}

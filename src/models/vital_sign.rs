use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::enums::{BloodPressureCategory, GlucoseContext};
use super::record::{MedicalRecord, RecordKind};

/// Implements the date/time/id plumbing shared by timed measurements.
macro_rules! timed_record {
    ($ty:ident, $kind:expr) => {
        impl MedicalRecord for $ty {
            const KIND: RecordKind = $kind;

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
                self.check_ranges()
            }
        }
    };
}

/// Blood pressure reading in mmHg, pulse in bpm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    #[serde(default)]
    pub id: String,
    pub systolic: u16,
    pub diastolic: u16,
    pub pulse: u16,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub notes: String,
}

impl BloodPressure {
    /// AHA category for this reading.
    pub fn category(&self) -> BloodPressureCategory {
        let (sys, dia) = (self.systolic, self.diastolic);
        if sys > 180 || dia > 120 {
            BloodPressureCategory::HypertensiveCrisis
        } else if sys >= 140 || dia >= 90 {
            BloodPressureCategory::Hypertension2
        } else if sys >= 130 || dia >= 80 {
            BloodPressureCategory::Hypertension1
        } else if sys >= 120 {
            BloodPressureCategory::Elevated
        } else {
            BloodPressureCategory::Normal
        }
    }

    fn check_ranges(&self) -> Result<(), String> {
        if self.systolic == 0 || self.diastolic == 0 {
            return Err("systolic and diastolic must be positive".into());
        }
        if self.diastolic >= self.systolic {
            return Err(format!(
                "diastolic ({}) must be lower than systolic ({})",
                self.diastolic, self.systolic
            ));
        }
        Ok(())
    }
}

timed_record!(BloodPressure, RecordKind::BloodPressure);

/// Capillary or venous glucose in mg/dL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodGlucose {
    #[serde(default)]
    pub id: String,
    pub value_mg_dl: f64,
    pub context: GlucoseContext,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub notes: String,
}

impl BloodGlucose {
    /// Same value in mmol/L.
    pub fn value_mmol_l(&self) -> f64 {
        self.value_mg_dl / 18.0
    }

    fn check_ranges(&self) -> Result<(), String> {
        if !self.value_mg_dl.is_finite() || self.value_mg_dl <= 0.0 {
            return Err(format!("glucose value must be positive, got {}", self.value_mg_dl));
        }
        Ok(())
    }
}

timed_record!(BloodGlucose, RecordKind::BloodGlucose);

/// Peripheral oxygen saturation (SpO2) in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OxygenSaturation {
    #[serde(default)]
    pub id: String,
    pub spo2: u8,
    pub pulse: Option<u16>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default)]
    pub notes: String,
}

impl OxygenSaturation {
    fn check_ranges(&self) -> Result<(), String> {
        if self.spo2 > 100 {
            return Err(format!("spo2 cannot exceed 100%, got {}", self.spo2));
        }
        Ok(())
    }
}

timed_record!(OxygenSaturation, RecordKind::OxygenSaturation);

#[cfg(test)]
mod tests {
    use super::*;

    fn bp(systolic: u16, diastolic: u16) -> BloodPressure {
        BloodPressure {
            id: String::new(),
            systolic,
            diastolic,
            pulse: 70,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
            notes: String::new(),
        }
    }

    #[test]
    fn blood_pressure_categories() {
        assert_eq!(bp(115, 75).category(), BloodPressureCategory::Normal);
        assert_eq!(bp(125, 75).category(), BloodPressureCategory::Elevated);
        assert_eq!(bp(125, 85).category(), BloodPressureCategory::Hypertension1);
        assert_eq!(bp(135, 70).category(), BloodPressureCategory::Hypertension1);
        assert_eq!(bp(150, 85).category(), BloodPressureCategory::Hypertension2);
        assert_eq!(bp(120, 95).category(), BloodPressureCategory::Hypertension2);
        assert_eq!(bp(185, 100).category(), BloodPressureCategory::HypertensiveCrisis);
        assert_eq!(bp(170, 125).category(), BloodPressureCategory::HypertensiveCrisis);
    }

    #[test]
    fn diastolic_above_systolic_is_invalid() {
        assert!(bp(80, 120).validate().is_err());
        assert!(bp(120, 80).validate().is_ok());
    }

    #[test]
    fn occurred_at_uses_time() {
        let reading = bp(120, 80);
        assert_eq!(reading.occurred_at().to_string(), "2024-01-05 08:30:00");
    }

    #[test]
    fn spo2_above_100_is_invalid() {
        let reading = OxygenSaturation {
            id: String::new(),
            spo2: 101,
            pulse: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            notes: String::new(),
        };
        assert!(reading.validate().is_err());
    }

    #[test]
    fn glucose_converts_to_mmol() {
        let reading = BloodGlucose {
            id: String::new(),
            value_mg_dl: 90.0,
            context: GlucoseContext::Fasting,
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            notes: String::new(),
        };
        assert!((reading.value_mmol_l() - 5.0).abs() < 0.01);
        assert!(reading.validate().is_ok());
    }
}

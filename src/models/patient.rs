use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::disease::DiseaseRef;
use super::enums::{BloodType, Sex};
use super::record::require_text;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(default)]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub blood_type: Option<BloodType>,
    /// Selected diagnosis, denormalized from the ICD search result.
    #[serde(default)]
    pub disease: Option<DiseaseRef>,
    #[serde(default)]
    pub notes: String,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Age in whole years on `today`, if the birth date is known.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let birth = self.birth_date?;
        if birth > today {
            return None;
        }
        let mut years = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            years -= 1;
        }
        u32::try_from(years).ok()
    }

    /// Case-insensitive substring match over first and last name.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty() || self.full_name().to_lowercase().contains(&needle)
    }

    pub fn validate(&self) -> Result<(), String> {
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)
    }
}

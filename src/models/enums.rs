use serde::{Deserialize, Serialize};

/// Closed enums stored by their snake_case wire name.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }
    };
}

str_enum!(Sex {
    Female => "female",
    Male => "male",
    Other => "other",
});

str_enum!(BloodType {
    APositive => "a_positive",
    ANegative => "a_negative",
    BPositive => "b_positive",
    BNegative => "b_negative",
    AbPositive => "ab_positive",
    AbNegative => "ab_negative",
    OPositive => "o_positive",
    ONegative => "o_negative",
});

str_enum!(AllergySeverity {
    Mild => "mild",
    Moderate => "moderate",
    Severe => "severe",
    LifeThreatening => "life_threatening",
});

str_enum!(GlucoseContext {
    Fasting => "fasting",
    BeforeMeal => "before_meal",
    AfterMeal => "after_meal",
    Random => "random",
});

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(BloodPressureCategory {
    Normal => "normal",
    Elevated => "elevated",
    Hypertension1 => "hypertension_1",
    Hypertension2 => "hypertension_2",
    HypertensiveCrisis => "hypertensive_crisis",
});

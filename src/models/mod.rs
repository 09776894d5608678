pub mod enums;
pub mod disease;
pub mod patient;
pub mod record;
pub mod allergy;
pub mod vaccine;
pub mod vital_sign;
pub mod examination;
pub mod laboratory;
pub mod prescription;
pub mod appointment;
pub mod radiology;

pub use enums::*;
pub use disease::*;
pub use patient::*;
pub use record::*;
pub use allergy::*;
pub use vaccine::*;
pub use vital_sign::*;
pub use examination::*;
pub use laboratory::*;
pub use prescription::*;
pub use appointment::*;
pub use radiology::*;

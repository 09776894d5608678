//! API endpoint handlers, one module per resource.

pub mod diseases;
pub mod health;
pub mod patients;
pub mod records;

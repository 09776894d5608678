//! Repository layer: table-scoped database operations.
//!
//! `document` backs the JSON document store, `setting` the device-local
//! key-value entries.

mod document;
mod setting;

pub use document::*;
pub use setting::*;

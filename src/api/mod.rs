//! HTTP API over patients, their records and the disease catalogue.
//!
//! Routes are nested under `/api/`. Handlers run repository and ICD calls
//! on the blocking pool; every failure is rendered as
//! `{ "error": { "code", "message" } }`.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;

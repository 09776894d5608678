//! Patient endpoints.
//!
//! - `GET /api/patients?q=`: list, optionally filtered by name
//! - `POST /api/patients`: create
//! - `GET|PUT|DELETE /api/patients/:id`
//! - `PUT|DELETE /api/patients/:id/disease`: attach or clear a diagnosis

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, PatientQuery};
use crate::error::run_blocking;
use crate::models::{Disease, Patient};

pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<PatientQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let text = query.q.unwrap_or_default();
    let patients = run_blocking(move || ctx.patients.search(&text)).await?;
    Ok(Json(patients))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    payload: Result<Json<Patient>, JsonRejection>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let Json(mut patient) = payload?;
    let id = {
        let patient = patient.clone();
        run_blocking(move || ctx.patients.add(&patient)).await?
    };
    patient.id = id;
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let lookup = id.clone();
    run_blocking(move || ctx.patients.get(&lookup))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Patient {id} not found")))
}

/// The id in the path wins over any id in the body. Any `disease` in the
/// body is ignored; use the `/disease` endpoints for that.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<Patient>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let Json(mut patient) = payload?;
    patient.id = id;
    let updated = run_blocking(move || ctx.patients.update(&patient)).await?;
    Ok(Json(updated))
}

pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    run_blocking(move || ctx.patients.delete(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_disease(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    payload: Result<Json<Disease>, JsonRejection>,
) -> Result<Json<Patient>, ApiError> {
    let Json(disease) = payload?;
    let patient = run_blocking(move || ctx.patients.set_disease(&id, &disease)).await?;
    Ok(Json(patient))
}

pub async fn clear_disease(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let patient = run_blocking(move || ctx.patients.clear_disease(&id)).await?;
    Ok(Json(patient))
}

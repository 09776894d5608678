//! Per-patient record endpoints. `:kind` is a collection name such as
//! `allergies` or `blood_pressure`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::error::run_blocking;

pub async fn list(
    State(ctx): State<ApiContext>,
    Path((patient_id, kind)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let repo = ctx.records_for(&kind)?;
    let records = run_blocking(move || repo.list(&patient_id)).await?;
    Ok(Json(records))
}

/// `GET /api/patients/:id/:kind/history`: records grouped by date.
pub async fn history(
    State(ctx): State<ApiContext>,
    Path((patient_id, kind)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let repo = ctx.records_for(&kind)?;
    let groups = run_blocking(move || repo.history(&patient_id)).await?;
    Ok(Json(groups))
}

pub async fn create(
    State(ctx): State<ApiContext>,
    Path((patient_id, kind)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = payload?;
    let repo = ctx.records_for(&kind)?;
    let record = run_blocking(move || repo.add(&patient_id, body)).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Path((patient_id, kind, record_id)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    let repo = ctx.records_for(&kind)?;
    let lookup = record_id.clone();
    run_blocking(move || repo.get(&patient_id, &lookup))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Record {record_id} not found")))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Path((patient_id, kind, record_id)): Path<(String, String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let repo = ctx.records_for(&kind)?;
    let record = run_blocking(move || repo.update(&patient_id, &record_id, body)).await?;
    Ok(Json(record))
}

pub async fn delete(
    State(ctx): State<ApiContext>,
    Path((patient_id, kind, record_id)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    let repo = ctx.records_for(&kind)?;
    run_blocking(move || repo.delete(&patient_id, &record_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

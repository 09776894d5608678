//! `GET /api/diseases/search?q=&lang=&chapter=`: ICD-11 lookup.
//!
//! `lang` defaults to the configured language. `chapter` is a
//! `;`-separated list of ICD chapters. A blank `q` returns `[]`.

use axum::extract::{Query, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, DiseaseQuery};
use crate::error::{run_blocking, AppError};
use crate::models::Disease;

pub async fn search(
    State(ctx): State<ApiContext>,
    Query(query): Query<DiseaseQuery>,
) -> Result<Json<Vec<Disease>>, ApiError> {
    if query.q.trim().is_empty() {
        return Ok(Json(Vec::new()));
    }

    let language = query.lang.unwrap_or_else(|| ctx.language.clone());
    let chapter = query.chapter.unwrap_or_default();
    let diseases = run_blocking(move || {
        ctx.diseases
            .search(&query.q, &language, &chapter)
            .map_err(AppError::from)
    })
    .await?;
    Ok(Json(diseases))
}

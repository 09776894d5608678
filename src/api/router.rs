//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use axum::routing::{get, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the API router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7). The
/// static `disease` and `history` segments take priority over `:kind`
/// and `:record_id`.
pub fn api_router(ctx: ApiContext) -> Router {
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::delete),
        )
        .route(
            "/patients/:id/disease",
            put(endpoints::patients::set_disease).delete(endpoints::patients::clear_disease),
        )
        .route(
            "/patients/:id/:kind",
            get(endpoints::records::list).post(endpoints::records::create),
        )
        .route(
            "/patients/:id/:kind/history",
            get(endpoints::records::history),
        )
        .route(
            "/patients/:id/:kind/:record_id",
            get(endpoints::records::detail)
                .put(endpoints::records::update)
                .delete(endpoints::records::delete),
        )
        .route("/diseases/search", get(endpoints::diseases::search))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
}

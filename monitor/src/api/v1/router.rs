use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::api::state::AppState;

use super::handlers;
use super::middleware::v1_auth_middleware;

pub fn v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/openapi.json", get(super::openapi::openapi_json))
        .merge(super::openapi::redoc_router());

    let support = Router::new()
        .route("/charts", get(handlers::support::support_charts))
        .route("/export", get(handlers::support::export_support));

    let kpis = Router::new()
        .route("/indicators", get(handlers::kpis::list_indicators))
        .route("/chart", get(handlers::kpis::kpi_chart));

    let catalog = Router::new()
        .route("/metrics", get(handlers::catalog::catalog_metrics))
        .route("/quality", get(handlers::catalog::catalog_quality))
        .route("/resources", get(handlers::catalog::catalog_resources));

    let hvd = Router::new()
        .route("/scores", get(handlers::hvd::hvd_scores))
        .route("/quality", get(handlers::hvd::hvd_quality))
        .route("/improvements", get(handlers::hvd::hvd_improvements))
        .route("/resources", get(handlers::hvd::hvd_resources));

    let protected_routes = Router::new()
        .nest("/support", support)
        .route("/kpis:refresh", post(handlers::kpis::refresh_kpis))
        .nest("/kpis", kpis)
        .nest("/catalog", catalog)
        .route("/reuses/chart", get(handlers::reuses::reuses_chart))
        .route(
            "/certification:refresh",
            post(handlers::certification::refresh_certification),
        )
        .route(
            "/certification/export",
            get(handlers::certification::export_certification),
        )
        .nest("/hvd", hvd)
        .route("/reports/chart", get(handlers::reports::reports_chart))
        .route("/siret:refresh", post(handlers::siret::refresh_siret))
        .route("/siret/export", get(handlers::siret::export_siret))
        .route("/actions", post(handlers::actions::run_action))
        .route_layer(middleware::from_fn_with_state(state, v1_auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}

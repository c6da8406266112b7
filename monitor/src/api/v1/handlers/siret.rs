//! v1 SIRET suggestion handlers.

use axum::extract::State;
use axum::response::{IntoResponse, Response};

use super::csv_download;
use crate::api::extractors::AppQuery;
use crate::api::v1::dto::SiretRefreshQuery;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode, ResponseMeta};
use crate::api::AppState;
use crate::dashboards::siret::{self, SiretSources, SiretSuggestion};
use crate::export::{siret_csv, SIRET_EXPORT_FILE};

/// `POST /api/v1/siret:refresh`
#[utoipa::path(
    post,
    path = "/api/v1/siret:refresh",
    tag = "siret",
    operation_id = "siret.refresh",
    params(SiretRefreshQuery),
    responses(
        (status = 200, description = "Organizations a SIRET can be attached to", body = Vec<SiretSuggestion>),
        (status = 400, description = "Invalid threshold", body = ApiError),
        (status = 502, description = "IRVE file or catalog unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn refresh_siret(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SiretRefreshQuery>,
) -> ApiResponse<Vec<SiretSuggestion>> {
    let threshold = match query.validated(state.config.dashboard.siret_threshold) {
        Ok(threshold) => threshold,
        Err(e) => return e.into(),
    };
    let clients = SiretSources {
        catalog: &state.catalog,
        registry: &state.registry,
        sources: &state.sources,
    };
    let suggestions = match siret::refresh(
        clients,
        threshold,
        state.config.dashboard.max_displayed_suggestions,
    )
    .await
    {
        Ok(suggestions) => suggestions,
        Err(e) => return e.into(),
    };
    let refreshed_at = state.session.set_siret(suggestions.clone()).await;

    let total = suggestions.len() as u64;
    ApiResponse::success_with_meta(
        suggestions,
        ResponseMeta {
            refreshed_at: Some(refreshed_at),
            total: Some(total),
        },
    )
}

/// `GET /api/v1/siret/export`
#[utoipa::path(
    get,
    path = "/api/v1/siret/export",
    tag = "siret",
    operation_id = "siret.export",
    responses(
        (status = 200, description = "Last SIRET suggestions", content_type = "text/csv", body = String),
        (status = 404, description = "No refresh yet", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn export_siret(State(state): State<AppState>) -> Response {
    let Some(cached) = state.session.siret().await else {
        return ApiResponse::<()>::error(
            ErrorCode::NotFound,
            "No SIRET suggestions yet. Call POST /api/v1/siret:refresh first.",
        )
        .into_response();
    };

    match siret_csv(&cached.value) {
        Ok(body) => csv_download(SIRET_EXPORT_FILE, body),
        Err(e) => ApiResponse::<()>::from(e).into_response(),
    }
}

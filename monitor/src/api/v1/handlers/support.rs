//! v1 support funnel handlers.

use axum::extract::State;
use axum::response::{IntoResponse, Response};

use super::csv_download;
use crate::api::v1::dto::SupportChartsResponse;
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;
use crate::dashboards::support::{self, SUPPORT_FILE};

/// `GET /api/v1/support/charts`
#[utoipa::path(
    get,
    path = "/api/v1/support/charts",
    tag = "support",
    operation_id = "support.charts",
    responses(
        (status = 200, description = "Ticket volumes and funnel conversion", body = SupportChartsResponse),
        (status = 502, description = "Snapshot unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn support_charts(State(state): State<AppState>) -> ApiResponse<SupportChartsResponse> {
    let stats = match support::load(&state.storage).await {
        Ok(stats) => stats,
        Err(e) => return e.into(),
    };
    let volumes = match support::volumes_chart(&stats) {
        Ok(chart) => chart,
        Err(e) => return e.into(),
    };

    ApiResponse::success(SupportChartsResponse {
        volumes,
        conversion: support::conversion_chart(&stats),
    })
}

/// `GET /api/v1/support/export`
#[utoipa::path(
    get,
    path = "/api/v1/support/export",
    tag = "support",
    operation_id = "support.export",
    responses(
        (status = 200, description = "Raw support statistics", content_type = "text/csv", body = String),
        (status = 502, description = "Snapshot unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn export_support(State(state): State<AppState>) -> Response {
    match support::raw(&state.storage).await {
        Ok(text) => csv_download(SUPPORT_FILE, text),
        Err(e) => ApiResponse::<()>::from(e).into_response(),
    }
}

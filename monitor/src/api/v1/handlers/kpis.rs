//! v1 KPI handlers. Charts read the dataset cached by the last refresh.

use axum::extract::State;

use crate::api::extractors::AppQuery;
use crate::api::v1::dto::{IndicatorsResponse, KpiChartQuery, KpiRefreshResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode, ResponseMeta};
use crate::api::AppState;
use crate::charts::Chart;
use crate::dashboards::kpi;

const NOT_REFRESHED: &str = "KPIs have not been loaded yet. Call POST /api/v1/kpis:refresh first.";

/// `POST /api/v1/kpis:refresh`
#[utoipa::path(
    post,
    path = "/api/v1/kpis:refresh",
    tag = "kpis",
    operation_id = "kpis.refresh",
    responses(
        (status = 200, description = "KPI dataset reloaded", body = KpiRefreshResponse),
        (status = 502, description = "KPI file unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn refresh_kpis(State(state): State<AppState>) -> ApiResponse<KpiRefreshResponse> {
    let dataset = match kpi::refresh(&state.sources).await {
        Ok(dataset) => dataset,
        Err(e) => return e.into(),
    };
    let response = KpiRefreshResponse {
        rows: dataset.rows.len(),
        indicators: dataset.indicators(),
    };
    let refreshed_at = state.session.set_kpis(dataset).await;

    ApiResponse::success_with_meta(
        response,
        ResponseMeta {
            refreshed_at: Some(refreshed_at),
            total: None,
        },
    )
}

/// `GET /api/v1/kpis/indicators`
#[utoipa::path(
    get,
    path = "/api/v1/kpis/indicators",
    tag = "kpis",
    operation_id = "kpis.indicators",
    responses(
        (status = 200, description = "Indicators of the cached dataset", body = IndicatorsResponse),
        (status = 404, description = "KPIs not loaded yet", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_indicators(State(state): State<AppState>) -> ApiResponse<IndicatorsResponse> {
    let Some(cached) = state.session.kpis().await else {
        return ApiResponse::error(ErrorCode::NotFound, NOT_REFRESHED);
    };
    let indicators = cached.value.indicators();

    ApiResponse::success_with_meta(
        IndicatorsResponse {
            indicators: indicators.clone(),
        },
        ResponseMeta {
            refreshed_at: Some(cached.refreshed_at),
            total: Some(indicators.len() as u64),
        },
    )
}

/// `GET /api/v1/kpis/chart`
#[utoipa::path(
    get,
    path = "/api/v1/kpis/chart",
    tag = "kpis",
    operation_id = "kpis.chart",
    params(KpiChartQuery),
    responses(
        (status = 200, description = "Monthly chart of the indicator", body = Chart),
        (status = 404, description = "Unknown indicator or KPIs not loaded", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn kpi_chart(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<KpiChartQuery>,
) -> ApiResponse<Chart> {
    let Some(cached) = state.session.kpis().await else {
        return ApiResponse::error(ErrorCode::NotFound, NOT_REFRESHED);
    };

    match cached.value.chart(&query.indicator) {
        Ok(chart) => ApiResponse::success_with_meta(
            chart,
            ResponseMeta {
                refreshed_at: Some(cached.refreshed_at),
                total: None,
            },
        ),
        Err(e) => e.into(),
    }
}

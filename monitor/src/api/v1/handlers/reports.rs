use axum::extract::State;

use crate::api::extractors::AppQuery;
use crate::api::v1::dto::ReportsQuery;
use crate::api::v1::response::{ApiError, ApiResponse, ResponseMeta};
use crate::api::AppState;
use crate::charts::Chart;
use crate::dashboards::reports;

/// `GET /api/v1/reports/chart`
#[utoipa::path(
    get,
    path = "/api/v1/reports/chart",
    tag = "reports",
    operation_id = "reports.chart",
    params(ReportsQuery),
    responses(
        (status = 200, description = "Monthly moderation reports", body = Chart),
        (status = 502, description = "Catalog API unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn reports_chart(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ReportsQuery>,
) -> ApiResponse<Chart> {
    let all = match reports::load(&state.catalog).await {
        Ok(all) => all,
        Err(e) => return e.into(),
    };

    ApiResponse::success_with_meta(
        reports::chart(&all, query.subject(), query.reason()),
        ResponseMeta {
            refreshed_at: None,
            total: Some(all.len() as u64),
        },
    )
}

use axum::extract::State;

use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;
use crate::charts::Chart;
use crate::dashboards::reuses;

/// `GET /api/v1/reuses/chart`
#[utoipa::path(
    get,
    path = "/api/v1/reuses/chart",
    tag = "reuses",
    operation_id = "reuses.chart",
    responses(
        (status = 200, description = "Unreachable reuses per month", body = Chart),
        (status = 502, description = "Snapshot unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn reuses_chart(State(state): State<AppState>) -> ApiResponse<Chart> {
    match reuses::load(&state.storage).await {
        Ok(history) => ApiResponse::success(reuses::chart(&history)),
        Err(e) => e.into(),
    }
}

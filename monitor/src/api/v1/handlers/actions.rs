use axum::extract::State;

use crate::actions::{dispatch, ActionOutcome, DashboardAction};
use crate::api::extractors::AppJson;
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;

/// `POST /api/v1/actions`
///
/// A failed write-back still answers 200 with an `error` outcome for the row.
#[utoipa::path(
    post,
    path = "/api/v1/actions",
    tag = "actions",
    operation_id = "actions.run",
    request_body = DashboardAction,
    responses(
        (status = 200, description = "Outcome of the action on its row", body = ActionOutcome),
        (status = 400, description = "Malformed or rejected action", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn run_action(
    State(state): State<AppState>,
    AppJson(action): AppJson<DashboardAction>,
) -> ApiResponse<ActionOutcome> {
    match dispatch(&action, &state.catalog).await {
        Ok(outcome) => ApiResponse::success(outcome),
        Err(e) => e.into(),
    }
}

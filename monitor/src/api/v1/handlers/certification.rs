//! v1 certification handlers.

use axum::extract::State;
use axum::response::{IntoResponse, Response};

use super::csv_download;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode, ResponseMeta};
use crate::api::AppState;
use crate::dashboards::certification::{self, CertificationReport, CertificationSources};
use crate::export::{certification_csv, CERTIFICATION_EXPORT_FILE};

/// `POST /api/v1/certification:refresh`
#[utoipa::path(
    post,
    path = "/api/v1/certification:refresh",
    tag = "certification",
    operation_id = "certification.refresh",
    responses(
        (status = 200, description = "Certification history, suggestions and issues", body = CertificationReport),
        (status = 404, description = "No certification snapshot", body = ApiError),
        (status = 502, description = "Storage or catalog unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn refresh_certification(
    State(state): State<AppState>,
) -> ApiResponse<CertificationReport> {
    let clients = CertificationSources {
        storage: &state.storage,
        catalog: &state.catalog,
        sources: &state.sources,
    };
    let report = match certification::refresh(
        clients,
        state.config.dashboard.max_displayed_suggestions,
    )
    .await
    {
        Ok(report) => report,
        Err(e) => return e.into(),
    };
    let refreshed_at = state
        .session
        .set_certification(report.suggestions.clone())
        .await;

    ApiResponse::success_with_meta(
        report,
        ResponseMeta {
            refreshed_at: Some(refreshed_at),
            total: None,
        },
    )
}

/// `GET /api/v1/certification/export`
#[utoipa::path(
    get,
    path = "/api/v1/certification/export",
    tag = "certification",
    operation_id = "certification.export",
    responses(
        (status = 200, description = "Last certification suggestions", content_type = "text/csv", body = String),
        (status = 404, description = "No refresh yet", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn export_certification(State(state): State<AppState>) -> Response {
    let Some(cached) = state.session.certification().await else {
        return ApiResponse::<()>::error(
            ErrorCode::NotFound,
            "No certification suggestions yet. Call POST /api/v1/certification:refresh first.",
        )
        .into_response();
    };

    match certification_csv(&cached.value) {
        Ok(body) => csv_download(CERTIFICATION_EXPORT_FILE, body),
        Err(e) => ApiResponse::<()>::from(e).into_response(),
    }
}

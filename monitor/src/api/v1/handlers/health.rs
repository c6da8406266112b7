use axum::extract::State;
use serde::Serialize;

use crate::api::state::AppState;
use crate::api::v1::response::ApiResponse;

/// Health data returned inside the v1 envelope.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub storage: StorageStatus,
    pub catalog_api_url: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StorageStatus {
    pub bucket: String,
    pub folder: String,
}

/// `GET /api/v1/health`
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> ApiResponse<HealthData> {
    ApiResponse::success(HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: StorageStatus {
            bucket: state.config.storage.bucket.clone(),
            folder: state.config.storage.folder.clone(),
        },
        catalog_api_url: state.config.catalog.api_url.clone(),
    })
}

//! v1 catalog quality and resource format handlers.

use axum::extract::State;

use crate::api::extractors::AppQuery;
use crate::api::v1::dto::{CatalogQualityQuery, MetricsQuery, MetricsResponse, ResourcesQuery};
use crate::api::v1::response::{ApiError, ApiResponse};
use crate::api::AppState;
use crate::charts::Chart;
use crate::dashboards::catalog::{
    formats_chart, quality_chart, quality_series, DATASETS_QUALITY_FILE, RESOURCES_STATS_FILE,
};
use crate::dashboards::snapshot_document;

/// `GET /api/v1/catalog/metrics`
#[utoipa::path(
    get,
    path = "/api/v1/catalog/metrics",
    tag = "catalog",
    operation_id = "catalog.metrics",
    params(MetricsQuery),
    responses(
        (status = 200, description = "Selectable quality criteria", body = MetricsResponse),
        (status = 400, description = "Unknown object type", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn catalog_metrics(AppQuery(query): AppQuery<MetricsQuery>) -> ApiResponse<MetricsResponse> {
    let object_type = query.object_type();
    ApiResponse::success(MetricsResponse {
        object_type,
        metrics: object_type.metrics().to_vec(),
    })
}

/// `GET /api/v1/catalog/quality`
#[utoipa::path(
    get,
    path = "/api/v1/catalog/quality",
    tag = "catalog",
    operation_id = "catalog.quality",
    params(CatalogQualityQuery),
    responses(
        (status = 200, description = "Monthly mean of the metric with dataset counts", body = Chart),
        (status = 400, description = "Unknown scope or metric", body = ApiError),
        (status = 502, description = "Snapshot unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn catalog_quality(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CatalogQualityQuery>,
) -> ApiResponse<Chart> {
    let (scope, metric) = match query.validated() {
        Ok(params) => params,
        Err(e) => return e.into(),
    };
    let doc = match snapshot_document(&state.storage, DATASETS_QUALITY_FILE).await {
        Ok(doc) => doc,
        Err(e) => return e.into(),
    };

    let points = quality_series(&doc, scope.as_str(), &metric);
    ApiResponse::success(quality_chart(&points, "Nombre de jeux de données"))
}

/// `GET /api/v1/catalog/resources`
#[utoipa::path(
    get,
    path = "/api/v1/catalog/resources",
    tag = "catalog",
    operation_id = "catalog.resources",
    params(ResourcesQuery),
    responses(
        (status = 200, description = "Monthly resource counts per format", body = Chart),
        (status = 400, description = "Invalid kind or threshold", body = ApiError),
        (status = 502, description = "Snapshot unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn catalog_resources(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ResourcesQuery>,
) -> ApiResponse<Chart> {
    let (kind, threshold) = match query.validated() {
        Ok(params) => params,
        Err(e) => return e.into(),
    };

    match snapshot_document(&state.storage, RESOURCES_STATS_FILE).await {
        Ok(doc) => ApiResponse::success(formats_chart(&doc, kind.as_str(), threshold)),
        Err(e) => e.into(),
    }
}

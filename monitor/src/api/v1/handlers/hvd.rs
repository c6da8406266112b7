//! v1 high-value dataset handlers.

use axum::extract::State;

use crate::api::extractors::AppQuery;
use crate::api::v1::dto::{HvdQualityQuery, HvdResourcesQuery, ImprovementsResponse};
use crate::api::v1::response::{ApiError, ApiResponse, ResponseMeta};
use crate::api::AppState;
use crate::charts::Chart;
use crate::dashboards::catalog::RESOURCES_STATS_FILE;
use crate::dashboards::hvd::{self, HvdQuality};
use crate::dashboards::snapshot_document;

/// `GET /api/v1/hvd/scores`
#[utoipa::path(
    get,
    path = "/api/v1/hvd/scores",
    tag = "hvd",
    operation_id = "hvd.scores",
    responses(
        (status = 200, description = "HVD quality score history", body = Chart),
        (status = 502, description = "Pipeline exports unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn hvd_scores(State(state): State<AppState>) -> ApiResponse<Chart> {
    match hvd::score_history(&state.storage).await {
        Ok(points) => ApiResponse::success(hvd::scores_chart(&points)),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/hvd/quality`
#[utoipa::path(
    get,
    path = "/api/v1/hvd/quality",
    tag = "hvd",
    operation_id = "hvd.quality",
    params(HvdQualityQuery),
    responses(
        (status = 200, description = "Monthly criterion mean with its latest value", body = HvdQuality),
        (status = 400, description = "Unknown object type or metric", body = ApiError),
        (status = 502, description = "Snapshot unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn hvd_quality(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<HvdQualityQuery>,
) -> ApiResponse<HvdQuality> {
    let (object_type, metric) = match query.validated() {
        Ok(params) => params,
        Err(e) => return e.into(),
    };

    match hvd::load_quality(&state.storage, object_type, &metric).await {
        Ok(quality) => ApiResponse::success(quality),
        Err(e) => e.into(),
    }
}

/// `GET /api/v1/hvd/improvements`
///
/// Lists HVD objects failing the criterion. Nothing is fetched from the
/// catalog when every object already meets it or the metric is the
/// aggregate score.
#[utoipa::path(
    get,
    path = "/api/v1/hvd/improvements",
    tag = "hvd",
    operation_id = "hvd.improvements",
    params(HvdQualityQuery),
    responses(
        (status = 200, description = "Objects to improve", body = ImprovementsResponse),
        (status = 400, description = "Unknown object type or metric", body = ApiError),
        (status = 502, description = "Snapshot, catalog or HVD catalogue unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn hvd_improvements(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<HvdQualityQuery>,
) -> ApiResponse<ImprovementsResponse> {
    let (object_type, metric) = match query.validated() {
        Ok(params) => params,
        Err(e) => return e.into(),
    };
    let progression = match hvd::load_quality(&state.storage, object_type, &metric).await {
        Ok(quality) => quality.progression,
        Err(e) => return e.into(),
    };
    if !hvd::needs_improvements(&metric, progression) {
        return ApiResponse::success(ImprovementsResponse {
            items: Vec::new(),
            progression,
        });
    }

    let catalogue = match state.sources.hvd_catalogue().await {
        Ok(catalogue) => catalogue,
        Err(e) => return e.into(),
    };
    let items = match hvd::load_improvements(
        &state.catalog,
        &catalogue,
        object_type,
        &metric,
        state.config.dashboard.max_displayed_suggestions,
    )
    .await
    {
        Ok(items) => items,
        Err(e) => return e.into(),
    };

    let total = items.len() as u64;
    ApiResponse::success_with_meta(
        ImprovementsResponse { items, progression },
        ResponseMeta {
            refreshed_at: None,
            total: Some(total),
        },
    )
}

/// `GET /api/v1/hvd/resources`
#[utoipa::path(
    get,
    path = "/api/v1/hvd/resources",
    tag = "hvd",
    operation_id = "hvd.resources",
    params(HvdResourcesQuery),
    responses(
        (status = 200, description = "Monthly HVD resource counts per format", body = Chart),
        (status = 400, description = "Invalid threshold", body = ApiError),
        (status = 502, description = "Snapshot unavailable", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn hvd_resources(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<HvdResourcesQuery>,
) -> ApiResponse<Chart> {
    let threshold = match query.validated() {
        Ok(threshold) => threshold,
        Err(e) => return e.into(),
    };

    match snapshot_document(&state.storage, RESOURCES_STATS_FILE).await {
        Ok(doc) => ApiResponse::success(hvd::resources_chart(&doc, threshold)),
        Err(e) => e.into(),
    }
}

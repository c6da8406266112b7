use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use super::response;
use crate::{actions, charts, dashboards};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "data.gouv.fr Monitor API",
        version = "1.0.0",
        description = "Operational dashboards of data.gouv.fr: support funnel, KPIs, catalog quality, reuse health, moderation reports, certification and SIRET suggestions.",
    ),
    paths(
        handlers::health::health_check,
        handlers::support::support_charts,
        handlers::support::export_support,
        handlers::kpis::refresh_kpis,
        handlers::kpis::list_indicators,
        handlers::kpis::kpi_chart,
        handlers::catalog::catalog_metrics,
        handlers::catalog::catalog_quality,
        handlers::catalog::catalog_resources,
        handlers::reuses::reuses_chart,
        handlers::certification::refresh_certification,
        handlers::certification::export_certification,
        handlers::hvd::hvd_scores,
        handlers::hvd::hvd_quality,
        handlers::hvd::hvd_improvements,
        handlers::hvd::hvd_resources,
        handlers::reports::reports_chart,
        handlers::siret::refresh_siret,
        handlers::siret::export_siret,
        handlers::actions::run_action,
    ),
    components(schemas(
        response::ApiError,
        response::ErrorCode,
        response::ResponseMeta,
        handlers::health::HealthData,
        handlers::health::StorageStatus,
        charts::Chart,
        charts::Trace,
        charts::Axis,
        charts::TraceKind,
        charts::YAxis,
        charts::BarMode,
        dto::SupportChartsResponse,
        dto::KpiRefreshResponse,
        dto::IndicatorsResponse,
        dto::MetricsResponse,
        dto::ImprovementsResponse,
        dashboards::catalog::Metric,
        dashboards::catalog::ObjectType,
        dashboards::catalog::DatasetScope,
        dashboards::catalog::ResourceKind,
        dashboards::hvd::HvdQuality,
        dashboards::hvd::ImprovementRow,
        dashboards::certification::CertificationReport,
        dashboards::certification::CertificationSuggestion,
        dashboards::certification::CertificationIssue,
        dashboards::siret::SiretSuggestion,
        actions::DashboardAction,
        actions::ActionOutcome,
        actions::ActionStatus,
    )),
    tags(
        (name = "health", description = "Health check"),
        (name = "support", description = "Support funnel volumes and conversion"),
        (name = "kpis", description = "Published key performance indicators"),
        (name = "catalog", description = "Catalog quality scores and resource formats"),
        (name = "reuses", description = "Unreachable reuses"),
        (name = "certification", description = "Certification history and suggestions"),
        (name = "hvd", description = "High-value datasets quality and improvements"),
        (name = "reports", description = "Moderation reports"),
        (name = "siret", description = "SIRET attachment suggestions"),
        (name = "actions", description = "Write-back actions on organizations"),
    ),
    security(("bearer_auth" = [])),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(utoipa::openapi::security::Http::new(
                utoipa::openapi::security::HttpAuthScheme::Bearer,
            )),
        );
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}

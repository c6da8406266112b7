//! Response bodies of the v1 dashboard endpoints.

use serde::Serialize;

use crate::charts::Chart;
use crate::dashboards::catalog::{Metric, ObjectType};
use crate::dashboards::hvd::ImprovementRow;

/// Both charts of the support funnel.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupportChartsResponse {
    /// Ticket volumes with support page visits on the secondary axis.
    pub volumes: Chart,
    /// Conversion rates between consecutive funnel steps.
    pub conversion: Chart,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KpiRefreshResponse {
    pub rows: usize,
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorsResponse {
    /// In first-seen order.
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub object_type: ObjectType,
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementsResponse {
    /// Empty when the criterion needs no improvement.
    pub items: Vec<ImprovementRow>,
    /// Latest monthly mean of the criterion.
    pub progression: Option<f64>,
}

//! Query parameters of the v1 dashboard endpoints.

use serde::Deserialize;

use crate::dashboards::catalog::{DatasetScope, ObjectType, ResourceKind};
use crate::dashboards::reports::ALL;
use crate::error::{MonitorError, Result};

/// Default share of the latest month's resources under which a format is
/// grouped into "Autres formats".
pub const DEFAULT_FORMAT_THRESHOLD: f64 = 2.0;

fn check_threshold(threshold: Option<f64>) -> Result<f64> {
    let threshold = threshold.unwrap_or(DEFAULT_FORMAT_THRESHOLD);
    if (0.0..=100.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(MonitorError::Validation(format!(
            "threshold must be a percentage between 0 and 100, got {threshold}"
        )))
    }
}

fn check_metric(object_type: ObjectType, metric: Option<&str>) -> Result<String> {
    match metric {
        None => Ok(object_type.metrics()[0].value.to_string()),
        Some(metric) if object_type.has_metric(metric) => Ok(metric.to_string()),
        Some(metric) => Err(MonitorError::Validation(format!(
            "Unknown {} quality metric '{metric}'",
            object_type.as_str()
        ))),
    }
}

/// Query for `GET /api/v1/kpis/chart`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct KpiChartQuery {
    /// Indicator name, as listed by `GET /api/v1/kpis/indicators`.
    pub indicator: String,
}

/// Query for `GET /api/v1/catalog/metrics`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    /// `datasets` (default) or `dataservices`.
    pub object_type: Option<ObjectType>,
}

impl MetricsQuery {
    pub fn object_type(&self) -> ObjectType {
        self.object_type.unwrap_or(ObjectType::Datasets)
    }
}

/// Query for `GET /api/v1/catalog/quality`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQualityQuery {
    /// Dataset population (default `all`).
    pub scope: Option<DatasetScope>,
    /// Dataset quality metric (default `score`).
    pub metric: Option<String>,
}

impl CatalogQualityQuery {
    pub fn validated(&self) -> Result<(DatasetScope, String)> {
        let metric = check_metric(ObjectType::Datasets, self.metric.as_deref())?;
        Ok((self.scope.unwrap_or_default(), metric))
    }
}

/// Query for `GET /api/v1/catalog/resources`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesQuery {
    /// Resource type (default `all`).
    pub kind: Option<ResourceKind>,
    /// Percentage of the latest month's total under which formats are
    /// grouped (default 2).
    pub threshold: Option<f64>,
}

impl ResourcesQuery {
    pub fn validated(&self) -> Result<(ResourceKind, f64)> {
        Ok((self.kind.unwrap_or_default(), check_threshold(self.threshold)?))
    }
}

/// Query for `GET /api/v1/hvd/quality` and `GET /api/v1/hvd/improvements`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct HvdQualityQuery {
    /// `datasets` (default) or `dataservices`.
    pub object_type: Option<ObjectType>,
    /// Quality metric of the object type (default: its first metric).
    pub metric: Option<String>,
}

impl HvdQualityQuery {
    pub fn validated(&self) -> Result<(ObjectType, String)> {
        let object_type = self.object_type.unwrap_or(ObjectType::Datasets);
        let metric = check_metric(object_type, self.metric.as_deref())?;
        Ok((object_type, metric))
    }
}

/// Query for `GET /api/v1/hvd/resources`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct HvdResourcesQuery {
    /// Grouping percentage (default 2).
    pub threshold: Option<f64>,
}

impl HvdResourcesQuery {
    pub fn validated(&self) -> Result<f64> {
        check_threshold(self.threshold)
    }
}

/// Query for `GET /api/v1/reports/chart`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ReportsQuery {
    /// Subject class such as `Dataset`, or `all` (default).
    pub subject: Option<String>,
    /// Report reason key such as `spam`, or `all` (default).
    pub reason: Option<String>,
}

impl ReportsQuery {
    pub fn subject(&self) -> &str {
        self.subject.as_deref().unwrap_or(ALL)
    }

    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or(ALL)
    }
}

/// Query for `POST /api/v1/siret:refresh`.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct SiretRefreshQuery {
    /// Minimum name similarity (exclusive, 0-100). Defaults to the
    /// configured threshold.
    pub threshold: Option<u8>,
}

impl SiretRefreshQuery {
    pub fn validated(&self, default: u8) -> Result<u8> {
        match self.threshold {
            Some(t) if t > 100 => Err(MonitorError::Validation(format!(
                "threshold must be between 0 and 100, got {t}"
            ))),
            Some(t) => Ok(t),
            None => Ok(default),
        }
    }
}

//! Catalog quality scores and resource formats over time.

use serde::{Deserialize, Serialize};

use super::{number_at, SnapshotDocument};
use crate::charts::{Axis, Chart, Trace};
use crate::snapshots::{first_day_same_month, latest_day_of_each_month};

pub const DATASETS_QUALITY_FILE: &str = "datasets_quality.json";
pub const RESOURCES_STATS_FILE: &str = "resources_stats.json";

const OTHER_FORMATS: &str = "Autres formats";

/// A selectable quality criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct Metric {
    pub value: &'static str,
    pub label: &'static str,
}

const fn metric(value: &'static str, label: &'static str) -> Metric {
    Metric { value, label }
}

/// Dataset quality criteria, keys of the `quality` object of a dataset.
pub const DATASETS_QUALITY_METRICS: &[Metric] = &[
    metric("score", "Score qualité global"),
    metric("dataset_description_quality", "Description des données renseignée"),
    metric("resources_documentation", "Ressources documentées"),
    metric("license", "Licence renseignée"),
    metric("update_frequency", "Fréquence de mise à jour renseignée"),
    metric("update_fulfilled_in_time", "Fréquence de mise à jour respectée"),
    metric("temporal_coverage", "Couverture temporelle renseignée"),
    metric("spatial", "Couverture spatiale renseignée"),
    metric("has_open_format", "Formats de fichiers standards"),
    metric("all_resources_available", "Toutes les ressources sont disponibles"),
    metric("has_resources", "Au moins une ressource"),
];

/// Dataservice quality criteria, fields of a dataservice.
pub const DATASERVICES_QUALITY_METRICS: &[Metric] = &[
    metric("description", "Description renseignée"),
    metric("base_api_url", "URL de base renseignée"),
    metric("machine_documentation_url", "Documentation machine renseignée"),
    metric("technical_documentation_url", "Documentation technique renseignée"),
    metric("license", "Licence renseignée"),
    metric("rate_limiting", "Limite d'appels renseignée"),
    metric("availability", "Disponibilité renseignée"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Datasets,
    Dataservices,
}

impl ObjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Datasets => "datasets",
            ObjectType::Dataservices => "dataservices",
        }
    }

    pub fn metrics(self) -> &'static [Metric] {
        match self {
            ObjectType::Datasets => DATASETS_QUALITY_METRICS,
            ObjectType::Dataservices => DATASERVICES_QUALITY_METRICS,
        }
    }

    pub fn has_metric(self, value: &str) -> bool {
        self.metrics().iter().any(|m| m.value == value)
    }
}

/// Dataset population the quality scores are averaged over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DatasetScope {
    #[default]
    All,
    Harvested,
    Local,
}

impl DatasetScope {
    pub fn as_str(self) -> &'static str {
        match self {
            DatasetScope::All => "all",
            DatasetScope::Harvested => "harvested",
            DatasetScope::Local => "local",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    #[default]
    All,
    Main,
    Documentation,
    Api,
    Update,
    Code,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::All => "all",
            ResourceKind::Main => "main",
            ResourceKind::Documentation => "documentation",
            ResourceKind::Api => "api",
            ResourceKind::Update => "update",
            ResourceKind::Code => "code",
        }
    }
}

/// Mean score of one month with the size of the population it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityPoint {
    /// First day of the month.
    pub month: String,
    pub mean: f64,
    pub count: f64,
}

/// Monthly series of `doc[date][scope][metric]` with `doc[date].count[scope]`.
///
/// Months whose latest snapshot lacks the scope or metric are left out.
pub fn quality_series(doc: &SnapshotDocument, scope: &str, metric: &str) -> Vec<QualityPoint> {
    latest_day_of_each_month(doc.keys())
        .values()
        .filter_map(|date| {
            let snapshot = doc.get(date)?;
            Some(QualityPoint {
                month: first_day_same_month(date),
                mean: number_at(snapshot, &[scope, metric])?,
                count: number_at(snapshot, &["count", scope]).unwrap_or(0.0),
            })
        })
        .collect()
}

/// Bars of the monthly mean on `[0, 1]`, population size as a line on y2.
pub fn quality_chart(points: &[QualityPoint], count_label: &str) -> Chart {
    if points.is_empty() {
        return Chart::empty("Aucune donnée pour ce critère.");
    }

    let counts: Vec<f64> = points.iter().map(|p| p.count).collect();
    Chart::new()
        .x_axis(Axis::titled("Mois"))
        .y_axis(Axis::titled("Score moyen pour le critère sélectionné").with_range(0.0, 1.0))
        .y2_axis(Axis::titled(count_label).with_headroom(&counts))
        .trace(Trace::bar("moyenne").with_points(points.iter().map(|p| (p.month.clone(), p.mean))))
        .trace(
            Trace::line(count_label)
                .on_secondary()
                .with_points(points.iter().map(|p| (p.month.clone(), p.count))),
        )
}

/// Resource counts per format and month, formats weighing at most
/// `percent_threshold` % of the latest month folded into "Autres formats".
pub fn formats_chart(doc: &SnapshotDocument, kind: &str, percent_threshold: f64) -> Chart {
    let mut rows: Vec<(String, String, f64)> = Vec::new();
    for date in latest_day_of_each_month(doc.keys()).values() {
        let Some(formats) = doc.get(date).and_then(|d| d.get(kind)).and_then(|k| k.as_object())
        else {
            continue;
        };
        let month = first_day_same_month(date);
        for (format, count) in formats {
            if let Some(count) = count.as_f64() {
                rows.push((month.clone(), format.clone(), count));
            }
        }
    }

    let Some(last_month) = rows.iter().map(|(m, _, _)| m.clone()).max() else {
        return Chart::empty("Aucune ressource pour ce type.");
    };
    let threshold = percent_threshold / 100.0
        * rows
            .iter()
            .filter(|(m, _, _)| *m == last_month)
            .map(|(_, _, c)| c)
            .sum::<f64>();

    let (mut kept, other): (Vec<_>, Vec<_>) =
        rows.into_iter().partition(|(_, _, count)| *count > threshold);

    let mut other_months: Vec<String> = Vec::new();
    for (month, _, _) in &other {
        if !other_months.contains(month) {
            other_months.push(month.clone());
        }
    }
    for month in other_months {
        let sum = other
            .iter()
            .filter(|(m, _, _)| *m == month)
            .map(|(_, _, c)| c)
            .sum();
        kept.push((month, OTHER_FORMATS.to_string(), sum));
    }
    kept.sort_by(|a, b| b.2.total_cmp(&a.2));

    let mut traces: Vec<Trace> = Vec::new();
    for (month, format, count) in &kept {
        match traces.iter_mut().find(|t| t.name == *format) {
            Some(trace) => trace.point(month.clone(), *count),
            None => traces.push(Trace::bar(format.clone()).with_points([(month.clone(), *count)])),
        }
    }

    let mut monthly_sums: Vec<(String, f64)> = Vec::new();
    for (month, _, count) in &kept {
        match monthly_sums.iter_mut().find(|(m, _)| m == month) {
            Some((_, sum)) => *sum += count,
            None => monthly_sums.push((month.clone(), *count)),
        }
    }
    let sums: Vec<f64> = monthly_sums.into_iter().map(|(_, s)| s).collect();

    let mut chart = Chart::new()
        .x_axis(Axis::titled("Mois"))
        .y_axis(Axis::titled("Nombre de ressources par format de fichier").with_headroom(&sums));
    chart.traces = traces;
    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::parse_snapshot_document;

    const QUALITY: &str = r#"{
        "2024-01-03": {"all": {"score": 0.40}, "count": {"all": 100}},
        "2024-01-28": {"all": {"score": 0.42}, "count": {"all": 110}},
        "2024-02-27": {"all": {"score": 0.45}, "hvd": {"score": 0.8}, "count": {"all": 120, "hvd": 12}}
    }"#;

    #[test]
    fn quality_uses_latest_snapshot_per_month() {
        let doc = parse_snapshot_document(QUALITY).unwrap();
        let points = quality_series(&doc, "all", "score");
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].month, "2024-01-01");
        assert_eq!(points[0].mean, 0.42);
        assert_eq!(points[0].count, 110.0);
        assert_eq!(points[1].month, "2024-02-01");
    }

    #[test]
    fn quality_skips_months_without_scope() {
        let doc = parse_snapshot_document(QUALITY).unwrap();
        let points = quality_series(&doc, "hvd", "score");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].count, 12.0);
    }

    #[test]
    fn quality_chart_has_count_on_secondary_axis() {
        let doc = parse_snapshot_document(QUALITY).unwrap();
        let chart = quality_chart(&quality_series(&doc, "all", "score"), "Nombre de jeux de données");
        assert_eq!(chart.y_axis.range, Some([0.0, 1.0]));
        assert_eq!(chart.traces.len(), 2);
        assert_eq!(chart.traces[1].y, vec![110.0, 120.0]);
        assert!(quality_chart(&[], "n").message.is_some());
    }

    #[test]
    fn small_formats_are_grouped() {
        let doc = parse_snapshot_document(
            r#"{
                "2024-01-31": {"all": {"csv": 90, "json": 8, "xml": 2}},
                "2024-02-29": {"all": {"csv": 95, "json": 4, "xml": 1}}
            }"#,
        )
        .unwrap();
        // threshold = 5% of 100 = 5
        let chart = formats_chart(&doc, "all", 5.0);
        let names: Vec<&str> = chart.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["csv", "json", OTHER_FORMATS]);

        let json = &chart.traces[1];
        assert_eq!(json.x, vec!["2024-01-01"]);
        let other = &chart.traces[2];
        assert_eq!(other.x, vec!["2024-02-01", "2024-01-01"]);
        assert_eq!(other.y, vec![5.0, 2.0]);

        let [_, max] = chart.y_axis.range.unwrap();
        assert!((max - 110.0).abs() < 1e-9);
    }

    #[test]
    fn formats_without_data_give_empty_chart() {
        let doc = parse_snapshot_document(r#"{"2024-01-31": {"main": {"csv": 1}}}"#).unwrap();
        assert!(formats_chart(&doc, "api", 2.0).message.is_some());
    }

    #[test]
    fn object_type_metrics() {
        assert!(ObjectType::Datasets.has_metric("score"));
        assert!(!ObjectType::Dataservices.has_metric("score"));
        assert_eq!(ObjectType::Dataservices.as_str(), "dataservices");
    }
}

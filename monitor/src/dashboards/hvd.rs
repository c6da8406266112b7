//! High-value datasets: quality history, criteria and objects to improve.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::catalog::{formats_chart, quality_chart, quality_series, ObjectType, QualityPoint};
use super::{number_at, snapshot_document, SnapshotDocument};
use crate::charts::{round_to, Axis, Chart, Trace};
use crate::clients::{CatalogClient, HvdCatalogue, StorageClient};
use crate::error::Result;
use crate::snapshots::{first_day_same_month, latest_day_of_each_month};
use crate::tabular::Table;

pub const HVD_SCOPE: &str = "hvd";
pub const HVD_DATASERVICES_QUALITY_FILE: &str = "hvd_dataservices_quality.json";

const SCORE_FILE_SUFFIX: &str = "grist_hvd.csv";
const SCORE_COLUMN: &str = "score_qualite_hvd";
const DATASETS_MASK: &str = "data{title,organization,tags,id,quality,slug}";

/// Mean HVD quality score of one pipeline export.
#[derive(Debug, Clone, PartialEq)]
pub struct ScorePoint {
    pub month: String,
    pub mean: f64,
    pub count: usize,
}

/// One point per `<date>...grist_hvd.csv` export. The month comes from the
/// file name, the mean skips blank scores.
pub fn score_point(key: &str, text: &str) -> Result<ScorePoint> {
    let table = Table::from_csv_with(text, b';')?;
    let column = table.column(SCORE_COLUMN)?;
    let scores: Vec<f64> = table
        .rows
        .iter()
        .filter_map(|row| table.number(row, column))
        .collect();
    let mean = if scores.is_empty() {
        0.0
    } else {
        round_to(scores.iter().sum::<f64>() / scores.len() as f64, 2)
    };

    let file_name = key.rsplit('/').next().unwrap_or(key);
    Ok(ScorePoint {
        month: first_day_same_month(file_name),
        mean,
        count: table.rows.len(),
    })
}

pub fn scores_chart(points: &[ScorePoint]) -> Chart {
    let counts: Vec<f64> = points.iter().map(|p| p.count as f64).collect();
    Chart::new()
        .x_axis(Axis::titled("Mois"))
        .y_axis(Axis::titled("Score qualité HVD par mois").with_range(0.0, 1.0))
        .y2_axis(Axis::titled("Nombre de JdD HVD").with_headroom(&counts))
        .trace(Trace::bar("mean").with_points(points.iter().map(|p| (p.month.clone(), p.mean))))
        .trace(
            Trace::line("Nombre de JdD HVD")
                .on_secondary()
                .with_points(points.iter().map(|p| (p.month.clone(), p.count as f64))),
        )
}

pub async fn score_history(storage: &StorageClient) -> Result<Vec<ScorePoint>> {
    let bucket = &storage.config().pipeline_bucket;
    let keys = storage
        .list_objects(bucket, &storage.config().hvd_prefix, false)
        .await?;

    let mut points = Vec::new();
    for key in keys.iter().filter(|k| k.ends_with(SCORE_FILE_SUFFIX)) {
        let text = storage.get_object(bucket, key).await?;
        points.push(score_point(key, &text)?);
    }
    debug!("Loaded {} HVD score exports", points.len());
    Ok(points)
}

/// Monthly mean of a dataservice criterion: `metrics[metric] / count`.
///
/// Months where the criterion is absent or zero are left out.
pub fn dataservices_series(doc: &SnapshotDocument, metric: &str) -> Vec<QualityPoint> {
    latest_day_of_each_month(doc.keys())
        .values()
        .filter_map(|date| {
            let snapshot = doc.get(date)?;
            let value = number_at(snapshot, &["metrics", metric]).filter(|v| *v != 0.0)?;
            let count = number_at(snapshot, &["count"]).filter(|c| *c > 0.0)?;
            Some(QualityPoint {
                month: first_day_same_month(date),
                mean: value / count,
                count,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HvdQuality {
    pub chart: Chart,
    /// Latest monthly mean, 1 meaning every object meets the criterion.
    pub progression: Option<f64>,
}

pub fn quality(doc: &SnapshotDocument, object_type: ObjectType, metric: &str) -> HvdQuality {
    let (points, count_label) = match object_type {
        ObjectType::Datasets => (
            quality_series(doc, HVD_SCOPE, metric),
            "Nombre de jeux de données",
        ),
        ObjectType::Dataservices => (dataservices_series(doc, metric), "Nombre d'APIs"),
    };
    HvdQuality {
        chart: quality_chart(&points, count_label),
        progression: points.last().map(|p| p.mean),
    }
}

fn quality_file(object_type: ObjectType) -> &'static str {
    match object_type {
        ObjectType::Datasets => super::catalog::DATASETS_QUALITY_FILE,
        ObjectType::Dataservices => HVD_DATASERVICES_QUALITY_FILE,
    }
}

pub async fn load_quality(
    storage: &StorageClient,
    object_type: ObjectType,
    metric: &str,
) -> Result<HvdQuality> {
    let doc = snapshot_document(storage, quality_file(object_type)).await?;
    Ok(quality(&doc, object_type, metric))
}

/// An HVD object failing the selected criterion, with its opening
/// catalogue context when known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementRow {
    pub title: String,
    pub organization: String,
    pub hvd_tags: String,
    pub url: String,
    pub ensemble: Option<String>,
    pub thematique: Option<String>,
}

/// A value counts as set unless it is null, false, zero or empty.
fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Improvements are pointless for the aggregate score or when the
/// criterion is already met everywhere.
pub fn needs_improvements(metric: &str, progression: Option<f64>) -> bool {
    metric != "score" && progression != Some(1.0)
}

fn misses_criterion(item: &Value, object_type: ObjectType, metric: &str) -> bool {
    let criteria = match object_type {
        ObjectType::Datasets => item.get("quality"),
        ObjectType::Dataservices => Some(item),
    };
    !is_set(criteria.and_then(|c| c.get(metric)))
}

pub fn objects_to_improve(
    items: &[Value],
    object_type: ObjectType,
    metric: &str,
    site_url: &str,
    catalogue: &HvdCatalogue,
    max: usize,
) -> Vec<ImprovementRow> {
    items
        .iter()
        .filter(|item| misses_criterion(item, object_type, metric))
        .take(max)
        .map(|item| {
            let text = |key: &str| item.get(key).and_then(Value::as_str).unwrap_or_default();
            let url = format!("{}/{}/{}/", site_url, object_type.as_str(), text("slug"));
            let tags: Vec<&str> = item
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| tags.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            let entry = catalogue.entry_for(&url);
            ImprovementRow {
                title: text("title").to_string(),
                organization: item
                    .pointer("/organization/name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                hvd_tags: catalogue.theme_labels(&tags),
                ensemble: entry.and_then(|e| e.ensemble.clone()),
                thematique: entry.and_then(|e| e.thematique.clone()),
                url,
            }
        })
        .collect()
}

pub async fn load_improvements(
    catalog: &CatalogClient,
    catalogue: &HvdCatalogue,
    object_type: ObjectType,
    metric: &str,
    max: usize,
) -> Result<Vec<ImprovementRow>> {
    let url = catalog.api_url(&format!("{}/?tag=hvd", object_type.as_str()));
    let mask = match object_type {
        ObjectType::Datasets => Some(DATASETS_MASK),
        ObjectType::Dataservices => None,
    };
    let items = catalog
        .get_all_until(&url, mask, |items| {
            items
                .iter()
                .filter(|item| misses_criterion(item, object_type, metric))
                .count()
                >= max
        })
        .await?;
    Ok(objects_to_improve(
        &items,
        object_type,
        metric,
        catalog.site_url(),
        catalogue,
        max,
    ))
}

pub fn resources_chart(doc: &SnapshotDocument, percent_threshold: f64) -> Chart {
    formats_chart(doc, HVD_SCOPE, percent_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::HvdCatalogueEntry;
    use crate::dashboards::parse_snapshot_document;
    use serde_json::json;

    #[test]
    fn score_point_from_export() {
        let text = "titre;score_qualite_hvd\nA;0.5\nB;0.75\nC;\n";
        let point = score_point("hvd/2024-03-04_grist_hvd.csv", text).unwrap();
        assert_eq!(point.month, "2024-03-01");
        assert_eq!(point.mean, 0.63);
        assert_eq!(point.count, 3);
    }

    #[test]
    fn dataservices_mean_is_ratio_to_count() {
        let doc = parse_snapshot_document(
            r#"{
                "2024-01-31": {"metrics": {"license": 5}, "count": 10},
                "2024-02-29": {"metrics": {"license": 0}, "count": 10}
            }"#,
        )
        .unwrap();
        let points = dataservices_series(&doc, "license");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].mean, 0.5);

        let quality = quality(&doc, ObjectType::Dataservices, "license");
        assert_eq!(quality.progression, Some(0.5));
    }

    #[test]
    fn improvements_skipped_when_met_or_score() {
        assert!(!needs_improvements("score", Some(0.2)));
        assert!(!needs_improvements("license", Some(1.0)));
        assert!(needs_improvements("license", Some(0.9)));
        assert!(needs_improvements("license", None));
    }

    #[test]
    fn objects_to_improve_joins_catalogue() {
        let site = "https://www.data.gouv.fr/fr";
        let catalogue = HvdCatalogue {
            entries: vec![HvdCatalogueEntry {
                url: format!("{site}/datasets/ban/"),
                object_type: "datasets",
                ensemble: Some("BAN".to_string()),
                thematique: Some("Géospatial".to_string()),
            }],
            categories: [("geospatial".to_string(), "Géospatial".to_string())].into(),
        };
        let items = vec![
            json!({"title": "BAN", "slug": "ban", "tags": ["hvd", "geospatial"],
                   "organization": {"name": "IGN"}, "quality": {"license": false}}),
            json!({"title": "OK", "slug": "ok", "tags": [], "organization": {"name": "X"},
                   "quality": {"license": true}}),
            json!({"title": "Missing", "slug": "missing", "tags": [],
                   "organization": {"name": "Y"}, "quality": {}}),
        ];

        let rows = objects_to_improve(&items, ObjectType::Datasets, "license", site, &catalogue, 10);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].hvd_tags, "Géospatial");
        assert_eq!(rows[0].ensemble.as_deref(), Some("BAN"));
        assert_eq!(rows[0].organization, "IGN");
        assert_eq!(rows[1].url, format!("{site}/datasets/missing/"));
        assert!(rows[1].ensemble.is_none());

        let capped = objects_to_improve(&items, ObjectType::Datasets, "license", site, &catalogue, 1);
        assert_eq!(capped.len(), 1);
    }

    #[test]
    fn dataservice_criteria_are_top_level_fields() {
        let items = vec![json!({"title": "API", "slug": "api", "rate_limiting": ""})];
        let rows = objects_to_improve(
            &items,
            ObjectType::Dataservices,
            "rate_limiting",
            "https://example.org",
            &HvdCatalogue::default(),
            5,
        );
        assert_eq!(rows[0].url, "https://example.org/dataservices/api/");
    }
}

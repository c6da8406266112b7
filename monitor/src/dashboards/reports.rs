//! Moderation reports per month.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::charts::{Axis, Chart, Trace};
use crate::clients::CatalogClient;
use crate::error::Result;
use crate::snapshots::first_day_same_month;

/// Filter value matching every reason or subject.
pub const ALL: &str = "all";

pub const REASONS: &[(&str, &str)] = &[
    ("personal_data", "Données personnelles"),
    ("explicit_content", "Contenu explicite"),
    ("illegal_content", "Contenu illégal"),
    ("others", "Autres"),
    ("security", "Sécurité"),
    ("spam", "Spam"),
];

pub const SUBJECTS: &[(&str, &str)] = &[
    ("Dataset", "Jeu de données"),
    ("Organization", "Organisation"),
    ("Reuse", "Réutilisation"),
    ("Dataservice", "API"),
    ("Discussion", "Discussion"),
];

fn label<'a>(labels: &[(&str, &'static str)], key: &'a str) -> &'a str {
    labels
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, l)| *l)
        .unwrap_or(key)
}

pub fn reason_label(key: &str) -> &str {
    label(REASONS, key)
}

pub fn subject_label(key: &str) -> &str {
    label(SUBJECTS, key)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportSubject {
    pub class: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Report {
    pub reason: String,
    pub subject: ReportSubject,
    pub reported_at: String,
}

/// Decode raw API items, dropping those missing a field the chart needs.
pub fn decode(items: Vec<Value>) -> Vec<Report> {
    let total = items.len();
    let reports: Vec<Report> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("Skipping malformed report: {}", e);
                None
            }
        })
        .collect();
    debug!("Decoded {} of {} reports", reports.len(), total);
    reports
}

fn matches(filter: &str, value: &str) -> bool {
    filter == ALL || filter == value
}

fn title(subject: &str, reason: &str) -> String {
    match (subject == ALL, reason == ALL) {
        (false, false) => format!(
            "Signalements par mois pour le motif `{reason}` et les {}s",
            subject.to_lowercase()
        ),
        (true, true) => "Signalements par mois pour tous les motifs et tous les objets".to_string(),
        (false, true) => format!(
            "Signalements par mois pour tous les motifs et les {}s",
            subject.to_lowercase()
        ),
        (true, false) => {
            format!("Signalements par mois pour le motif `{reason}` et tous les objets")
        }
    }
}

/// Monthly report volumes, split by reason when every reason is shown,
/// otherwise by subject unless a single subject is selected too.
pub fn chart(reports: &[Report], subject: &str, reason: &str) -> Chart {
    let selected: Vec<&Report> = reports
        .iter()
        .filter(|r| matches(subject, &r.subject.class) && matches(reason, &r.reason))
        .collect();
    if selected.is_empty() {
        return Chart::empty("Aucun signalement ne correspond à ces critères.");
    }

    let group_of = |r: &Report| -> String {
        if subject != ALL && reason != ALL {
            "Volume".to_string()
        } else if reason == ALL {
            reason_label(&r.reason).to_string()
        } else {
            subject_label(&r.subject.class).to_string()
        }
    };

    let mut volumes: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for report in selected {
        *volumes
            .entry(group_of(report))
            .or_default()
            .entry(first_day_same_month(&report.reported_at))
            .or_default() += 1.0;
    }

    let mut groups: Vec<(String, BTreeMap<String, f64>)> = volumes.into_iter().collect();
    groups.sort_by(|(_, a), (_, b)| {
        let (a, b): (f64, f64) = (a.values().sum(), b.values().sum());
        b.total_cmp(&a)
    });

    let mut chart = Chart::new()
        .titled(title(subject, reason))
        .x_axis(Axis::titled("Mois"))
        .y_axis(Axis::titled("Volume"));
    for (group, months) in groups {
        chart = chart.trace(Trace::bar(group).with_points(months));
    }
    chart.with_totals_on_top()
}

pub async fn load(catalog: &CatalogClient) -> Result<Vec<Report>> {
    let items = catalog.get_all(&catalog.api_url("reports/"), None).await?;
    Ok(decode(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::TraceKind;
    use serde_json::json;

    fn reports() -> Vec<Report> {
        decode(vec![
            json!({"reason": "spam", "subject": {"class": "Dataset"}, "reported_at": "2024-01-05T10:00:00"}),
            json!({"reason": "spam", "subject": {"class": "Reuse"}, "reported_at": "2024-01-20T10:00:00"}),
            json!({"reason": "security", "subject": {"class": "Dataset"}, "reported_at": "2024-02-02T10:00:00"}),
            json!({"reason": "new_reason", "subject": {"class": "Topic"}, "reported_at": "2024-02-03T10:00:00"}),
            json!({"subject": {"class": "Dataset"}}),
        ])
    }

    #[test]
    fn malformed_reports_are_dropped() {
        assert_eq!(reports().len(), 4);
    }

    #[test]
    fn groups_by_reason_when_all_reasons() {
        let chart = chart(&reports(), ALL, ALL);
        let names: Vec<&str> = chart.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Spam", "Sécurité", "new_reason", "Total"]);
        assert_eq!(chart.traces[0].x, vec!["2024-01-01"]);
        assert_eq!(chart.traces[0].y, vec![2.0]);

        let total = chart.traces.last().unwrap();
        assert_eq!(total.kind, TraceKind::Text);
        assert_eq!(total.y, vec![2.0, 2.0]);
        assert_eq!(
            chart.title.as_deref(),
            Some("Signalements par mois pour tous les motifs et tous les objets")
        );
    }

    #[test]
    fn groups_by_subject_for_one_reason() {
        let chart = chart(&reports(), ALL, "spam");
        let names: Vec<&str> = chart.traces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Jeu de données", "Réutilisation", "Total"]);
    }

    #[test]
    fn single_series_when_both_filters_set() {
        let chart = chart(&reports(), "Dataset", "spam");
        assert_eq!(chart.traces[0].name, "Volume");
        assert_eq!(chart.traces[0].y, vec![1.0]);
        assert_eq!(
            chart.title.as_deref(),
            Some("Signalements par mois pour le motif `spam` et les datasets")
        );
    }

    #[test]
    fn no_match_gives_message() {
        let chart = chart(&reports(), "Organization", ALL);
        assert!(chart.traces.is_empty());
        assert!(chart.message.is_some());
    }

    #[test]
    fn labels_fall_back_to_raw_key() {
        assert_eq!(subject_label("Dataservice"), "API");
        assert_eq!(reason_label("unknown"), "unknown");
    }
}

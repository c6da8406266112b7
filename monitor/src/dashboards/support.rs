//! Support funnel: page visits down to opened tickets.

use tracing::debug;

use crate::charts::{round_to, Axis, Chart, Trace};
use crate::clients::StorageClient;
use crate::error::{MonitorError, Result};
use crate::tabular::Table;

pub const SUPPORT_FILE: &str = "stats_support.csv";

const SUPPORT_PAGE: &str = "Page support";
const OPENED: &str = "Ouverture de ticket";
const OFF_TOPIC: &str = "Ticket hors-sujet";

/// Funnel steps (rows, in file order) by date (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct SupportStats {
    pub dates: Vec<String>,
    pub steps: Vec<(String, Vec<f64>)>,
}

impl SupportStats {
    pub fn parse(text: &str) -> Result<Self> {
        let table = Table::from_csv(text)?;
        let dates = table.headers.iter().skip(1).cloned().collect::<Vec<_>>();

        let mut steps = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let Some(label) = table.cell(row, 0) else {
                continue;
            };
            let values = (1..=dates.len())
                .map(|i| table.number(row, i).unwrap_or(0.0))
                .collect();
            steps.push((label.to_string(), values));
        }

        Ok(Self { dates, steps })
    }

    pub fn step(&self, name: &str) -> Result<&[f64]> {
        self.steps
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, values)| values.as_slice())
            .ok_or_else(|| MonitorError::Parse(format!("Missing support step '{name}'")))
    }
}

/// Tickets split into off-topic and the rest, with support page visits on
/// the secondary axis.
pub fn volumes_chart(stats: &SupportStats) -> Result<Chart> {
    let opened = stats.step(OPENED)?;
    let off_topic = stats.step(OFF_TOPIC)?;
    let visits = stats.step(SUPPORT_PAGE)?;

    let other = Trace::bar("Autre ticket").with_points(
        stats
            .dates
            .iter()
            .zip(opened.iter().zip(off_topic))
            .map(|(date, (o, h))| (date.clone(), o - h)),
    );
    let off_topic_bars = Trace::bar(OFF_TOPIC).with_points(
        stats.dates.iter().cloned().zip(off_topic.iter().copied()),
    );
    let visits_line = Trace::line("Nombre de visites sur le support")
        .on_secondary()
        .with_points(stats.dates.iter().cloned().zip(visits.iter().copied()));

    Ok(Chart::new()
        .x_axis(Axis::titled("Date"))
        .y_axis(Axis::titled("Nombre de tickets"))
        .y2_axis(Axis::titled("Nombre de visites sur le support").with_headroom(visits))
        .trace(other)
        .trace(off_topic_bars)
        .trace(visits_line))
}

/// Conversion rate (in %) between each pair of consecutive funnel steps.
pub fn conversion_chart(stats: &SupportStats) -> Chart {
    let mut chart = Chart::new()
        .x_axis(Axis::titled("Date"))
        .y_axis(Axis::titled("Taux de passage"));

    for pair in stats.steps.windows(2) {
        let (from, from_values) = &pair[0];
        let (to, to_values) = &pair[1];
        let mut trace = Trace::line(format!("{from} => {to}"));
        for ((date, a), b) in stats.dates.iter().zip(from_values).zip(to_values) {
            if *a == 0.0 {
                continue;
            }
            trace.point(date.clone(), round_to(b / a, 3) * 100.0);
        }
        chart = chart.trace(trace);
    }

    chart
}

pub async fn load(storage: &StorageClient) -> Result<SupportStats> {
    let stats = SupportStats::parse(&raw(storage).await?)?;
    debug!(
        "Loaded {} support steps over {} dates",
        stats.steps.len(),
        stats.dates.len()
    );
    Ok(stats)
}

/// The source file as stored, for download.
pub async fn raw(storage: &StorageClient) -> Result<String> {
    storage.get_file_content(SUPPORT_FILE).await
}

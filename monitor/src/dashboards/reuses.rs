//! Reuses whose link is down.

use crate::charts::{round_to, Axis, Chart, Trace};
use crate::clients::StorageClient;
use crate::error::Result;
use crate::snapshots::{latest_day_of_each_month, month_of};
use crate::tabular::Table;

pub const REUSES_DOWN_FILE: &str = "stats_reuses_down.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct ReuseHealth {
    pub date: String,
    pub not_found: f64,
    pub other_error: f64,
    pub total: f64,
}

impl ReuseHealth {
    /// Share of reuses in error, in %.
    pub fn down_rate(&self) -> Option<f64> {
        (self.total > 0.0)
            .then(|| round_to((self.not_found + self.other_error) / self.total * 100.0, 1))
    }
}

pub fn parse(text: &str) -> Result<Vec<ReuseHealth>> {
    let table = Table::from_csv(text)?;
    let date = table.column("Date")?;
    let not_found = table.column("404")?;
    let other = table.column("Autre erreur")?;
    let total = table.column("Total")?;

    Ok(table
        .rows
        .iter()
        .filter_map(|row| {
            Some(ReuseHealth {
                date: table.cell(row, date)?.to_string(),
                not_found: table.number(row, not_found).unwrap_or(0.0),
                other_error: table.number(row, other).unwrap_or(0.0),
                total: table.number(row, total).unwrap_or(0.0),
            })
        })
        .collect())
}

/// Stacked error counts for the last day of each month, with the down rate
/// on the secondary axis.
pub fn chart(history: &[ReuseHealth]) -> Chart {
    let latest = latest_day_of_each_month(history.iter().map(|h| h.date.as_str()));
    let monthly: Vec<(&str, &ReuseHealth)> = history
        .iter()
        .filter(|h| latest.values().any(|d| *d == h.date))
        .map(|h| (month_of(&h.date).unwrap_or(&h.date), h))
        .collect();

    let not_found = Trace::bar("404").with_points(monthly.iter().map(|(m, h)| (*m, h.not_found)));
    let other = Trace::bar("Autre erreur")
        .with_points(monthly.iter().map(|(m, h)| (*m, h.other_error)));
    let rate = Trace::line("Taux de reuses down")
        .on_secondary()
        .with_points(monthly.iter().filter_map(|(m, h)| Some((*m, h.down_rate()?))));
    let rates = rate.y.clone();

    Chart::new()
        .titled("Nombre de reuses qui renvoient une erreur")
        .x_axis(Axis::titled("Mois"))
        .y_axis(Axis::titled("Nombre"))
        .trace(not_found)
        .trace(other)
        .with_totals_on_top()
        .trace(rate)
        .y2_axis(Axis::titled("Taux de reuses down").with_headroom(&rates))
}

pub async fn load(storage: &StorageClient) -> Result<Vec<ReuseHealth>> {
    parse(&storage.get_file_content(REUSES_DOWN_FILE).await?)
}

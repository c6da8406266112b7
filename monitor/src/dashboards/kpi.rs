//! Platform KPIs published as a single long-format CSV.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::charts::{Axis, Chart, Trace, TraceKind};
use crate::clients::SourcesClient;
use crate::error::{MonitorError, Result};
use crate::snapshots::month_of;
use crate::tabular::Table;

#[derive(Debug, Clone, PartialEq)]
pub struct KpiRow {
    pub indicator: String,
    pub date: String,
    pub value: f64,
    pub unit: Option<String>,
    pub dataviz_wish: Option<String>,
}

/// All KPI rows of one download, kept in the session between refreshes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiDataset {
    pub rows: Vec<KpiRow>,
}

impl KpiDataset {
    pub fn parse(text: &str) -> Result<Self> {
        let table = Table::from_csv(text)?;
        let indicator = table.column("indicateur")?;
        let date = table.column("date")?;
        let value = table.column("valeur")?;
        let unit = table.column("unite_mesure")?;
        let wish = table.column("dataviz_wish")?;

        let mut rows = Vec::with_capacity(table.rows.len());
        let mut skipped = 0usize;
        for row in &table.rows {
            let (Some(name), Some(day), Some(v)) = (
                table.cell(row, indicator),
                table.cell(row, date),
                table.number(row, value),
            ) else {
                skipped += 1;
                continue;
            };
            rows.push(KpiRow {
                indicator: name.to_string(),
                date: day.to_string(),
                value: v,
                unit: table.cell(row, unit).map(str::to_string),
                dataviz_wish: table.cell(row, wish).map(str::to_string),
            });
        }

        if skipped > 0 {
            debug!("Skipped {} incomplete KPI rows", skipped);
        }
        Ok(Self { rows })
    }

    /// Indicator names in first-seen order.
    pub fn indicators(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter(|r| seen.insert(r.indicator.as_str()))
            .map(|r| r.indicator.clone())
            .collect()
    }

    /// Monthly chart of one indicator, keeping the earliest row of each month.
    pub fn chart(&self, indicator: &str) -> Result<Chart> {
        let mut rows: Vec<&KpiRow> = self
            .rows
            .iter()
            .filter(|r| r.indicator == indicator)
            .collect();
        if rows.is_empty() {
            return Err(MonitorError::NotFound(format!(
                "Unknown indicator '{indicator}'"
            )));
        }
        rows.sort_by(|a, b| a.date.cmp(&b.date));

        let mut months = HashSet::new();
        rows.retain(|r| months.insert(month_of(&r.date).unwrap_or(&r.date).to_string()));

        let first = rows[0];
        let kind = trace_kind(first.dataviz_wish.as_deref());
        let unit = first.unit.as_deref().unwrap_or_default();

        let trace = Trace::new(indicator, kind).with_points(
            rows.iter()
                .map(|r| (month_of(&r.date).unwrap_or(&r.date).to_string(), r.value)),
        );
        let values = trace.y.clone();

        Ok(Chart::new()
            .titled(indicator)
            .x_axis(Axis::titled("Mois"))
            .y_axis(Axis::titled(format!("Valeur ({unit})")).with_headroom(&values))
            .trace(trace))
    }
}

fn trace_kind(wish: Option<&str>) -> TraceKind {
    match wish {
        Some("linechart") => TraceKind::Line,
        Some("scatterplot") => TraceKind::Scatter,
        _ => TraceKind::Bar,
    }
}

pub async fn refresh(sources: &SourcesClient) -> Result<KpiDataset> {
    let text = sources.get_text(&sources.config().kpi_csv_url).await?;
    let dataset = KpiDataset::parse(&text)?;
    info!(
        "Refreshed {} KPI rows over {} indicators",
        dataset.rows.len(),
        dataset.indicators().len()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KPIS: &str = "\
indicateur,date,valeur,unite_mesure,dataviz_wish
Visites,2024-01-31,120,visites,linechart
Visites,2024-01-15,100,visites,linechart
Jeux de données,2024-01-31,40000,jeux,barchart
Visites,2024-02-29,150,visites,linechart
Réutilisations,2024-01-31,5,reuses,piechart
";

    #[test]
    fn indicators_in_first_seen_order() {
        let kpis = KpiDataset::parse(KPIS).unwrap();
        assert_eq!(
            kpis.indicators(),
            vec!["Visites", "Jeux de données", "Réutilisations"]
        );
    }

    #[test]
    fn chart_keeps_first_row_per_month() {
        let chart = KpiDataset::parse(KPIS).unwrap().chart("Visites").unwrap();
        let trace = &chart.traces[0];
        assert_eq!(trace.kind, TraceKind::Line);
        assert_eq!(trace.x, vec!["2024-01", "2024-02"]);
        assert_eq!(trace.y, vec![100.0, 150.0]);
        assert_eq!(chart.y_axis.title.as_deref(), Some("Valeur (visites)"));
        assert_eq!(chart.title.as_deref(), Some("Visites"));
    }

    #[test]
    fn unknown_wish_falls_back_to_bars() {
        let chart = KpiDataset::parse(KPIS)
            .unwrap()
            .chart("Réutilisations")
            .unwrap();
        assert_eq!(chart.traces[0].kind, TraceKind::Bar);
    }

    #[test]
    fn unknown_indicator_is_not_found() {
        let err = KpiDataset::parse(KPIS).unwrap().chart("Nope").unwrap_err();
        assert!(matches!(err, MonitorError::NotFound(_)));
    }

    #[test]
    fn missing_column_is_rejected() {
        assert!(KpiDataset::parse("indicateur,date\nA,2024-01-01\n").is_err());
    }
}

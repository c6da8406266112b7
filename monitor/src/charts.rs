//! Renderer-agnostic chart descriptions.
//!
//! Every dashboard returns [`Chart`]s: a list of named traces over shared
//! string x labels, with an optional secondary y axis. Clients pick the
//! plotting library; these types only carry what to draw.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a trace is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum TraceKind {
    Bar,
    Line,
    Scatter,
    /// Labels only, placed at `(x, y)`; used for totals above stacked bars.
    Text,
}

/// Which y axis a trace is plotted against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum YAxis {
    #[default]
    Primary,
    Secondary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum BarMode {
    #[default]
    Stack,
    Group,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `[min, max]`
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<f64>>)]
    pub range: Option<[f64; 2]>,
}

impl Axis {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            range: None,
        }
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some([min, max]);
        self
    }

    /// Range from zero to 10% above the largest value.
    pub fn with_headroom(self, values: &[f64]) -> Self {
        let max = values.iter().copied().fold(0.0_f64, f64::max);
        self.with_range(0.0, max * 1.1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    pub name: String,
    pub kind: TraceKind,
    pub x: Vec<String>,
    pub y: Vec<f64>,
    #[serde(default)]
    pub y_axis: YAxis,
    /// Per-point labels, same length as `x`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
}

impl Trace {
    pub fn new(name: impl Into<String>, kind: TraceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            x: Vec::new(),
            y: Vec::new(),
            y_axis: YAxis::Primary,
            text: None,
        }
    }

    pub fn bar(name: impl Into<String>) -> Self {
        Self::new(name, TraceKind::Bar)
    }

    pub fn line(name: impl Into<String>) -> Self {
        Self::new(name, TraceKind::Line)
    }

    pub fn on_secondary(mut self) -> Self {
        self.y_axis = YAxis::Secondary;
        self
    }

    pub fn point(&mut self, x: impl Into<String>, y: f64) {
        self.x.push(x.into());
        self.y.push(y);
    }

    pub fn with_points<I, X>(mut self, points: I) -> Self
    where
        I: IntoIterator<Item = (X, f64)>,
        X: Into<String>,
    {
        for (x, y) in points {
            self.point(x, y);
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub x_axis: Axis,
    pub y_axis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y2_axis: Option<Axis>,
    pub bar_mode: BarMode,
    pub traces: Vec<Trace>,
    /// Set instead of traces when there is nothing to plot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Chart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn x_axis(mut self, axis: Axis) -> Self {
        self.x_axis = axis;
        self
    }

    pub fn y_axis(mut self, axis: Axis) -> Self {
        self.y_axis = axis;
        self
    }

    pub fn y2_axis(mut self, axis: Axis) -> Self {
        self.y2_axis = Some(axis);
        self
    }

    pub fn grouped(mut self) -> Self {
        self.bar_mode = BarMode::Group;
        self
    }

    pub fn trace(mut self, trace: Trace) -> Self {
        self.traces.push(trace);
        self
    }

    /// Add a text trace with the sum of primary-axis bars above each x.
    pub fn with_totals_on_top(mut self) -> Self {
        let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
        for trace in self
            .traces
            .iter()
            .filter(|t| t.kind == TraceKind::Bar && t.y_axis == YAxis::Primary)
        {
            for (x, y) in trace.x.iter().zip(&trace.y) {
                *totals.entry(x.as_str()).or_default() += y;
            }
        }

        let mut total = Trace::new("Total", TraceKind::Text);
        for (x, y) in totals {
            total.x.push(x.to_string());
            total.y.push(y);
        }
        total.text = Some(total.y.iter().map(|v| format_number(*v)).collect());
        self.traces.push(total);
        self
    }
}

/// Integers without a decimal point, other values as-is.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Round half away from zero to `digits` decimals.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_sum_stacked_bars_per_x() {
        let chart = Chart::new()
            .trace(Trace::bar("404").with_points([("2024-01", 3.0), ("2024-02", 1.0)]))
            .trace(Trace::bar("Autre erreur").with_points([("2024-01", 2.0)]))
            .trace(Trace::line("Taux").on_secondary().with_points([("2024-01", 50.0)]))
            .with_totals_on_top();

        let total = chart.traces.last().unwrap();
        assert_eq!(total.kind, TraceKind::Text);
        assert_eq!(total.x, vec!["2024-01", "2024-02"]);
        assert_eq!(total.y, vec![5.0, 1.0]);
        assert_eq!(total.text.as_deref(), Some(&["5".to_string(), "1".to_string()][..]));
    }

    #[test]
    fn headroom_range() {
        let axis = Axis::titled("Visites").with_headroom(&[10.0, 40.0, 20.0]);
        let [min, max] = axis.range.unwrap();
        assert_eq!(min, 0.0);
        assert!((max - 44.0).abs() < 1e-9);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(0.66666, 3), 0.667);
        assert_eq!(round_to(12.25, 1), 12.3);
    }

    #[test]
    fn serializes_camel_case() {
        let chart = Chart::new().y2_axis(Axis::titled("n")).trace(Trace::bar("a"));
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["barMode"], "stack");
        assert_eq!(json["y2Axis"]["title"], "n");
        assert_eq!(json["traces"][0]["yAxis"], "primary");
        assert!(json.get("message").is_none());
    }
}

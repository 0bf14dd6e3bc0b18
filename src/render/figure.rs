//! Declarative plot description built from a [`Chart`].
//!
//! The output mirrors the trace/layout/config triple understood by Plotly so it
//! can be handed to a browser unchanged, and it is also what the terminal sink
//! draws from. Building a figure is a pure function of the chart.

use crate::models::{value_text, Chart, ChartKind, LineData, Points};
use crate::render::label::format_label;
use crate::render::palette::{self, Rgba};
use serde::Serialize;
use serde_json::Value;

const PIE_HOVER: &str = "<b>%{label}</b><br>Value: %{value}<br>Percentage: %{percent}<extra></extra>";

/// Traces plus layout, ready for a plotting sink
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceType {
    Pie,
    Bar,
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraceMode {
    #[serde(rename = "markers")]
    Markers,
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fill {
    None,
    ToNextY,
}

/// One drawable series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub trace_type: TraceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<TraceMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub textinfo: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub textposition: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovertemplate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Stroke>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fillcolor: Option<Rgba>,
}

impl Trace {
    fn new(trace_type: TraceType) -> Self {
        Self {
            trace_type,
            mode: None,
            name: None,
            x: None,
            y: None,
            values: None,
            labels: None,
            text: None,
            textinfo: None,
            textposition: None,
            hovertemplate: None,
            marker: None,
            line: None,
            fill: None,
            fillcolor: None,
        }
    }

    fn xy(trace_type: TraceType, x: &[Value], y: &[Value]) -> Self {
        Self {
            x: Some(x.to_vec()),
            y: Some(y.to_vec()),
            ..Self::new(trace_type)
        }
    }

    /// Paired numeric points, skipping non-numeric x by falling back to the index
    pub fn numeric_points(&self) -> Vec<(f64, f64)> {
        let (Some(x), Some(y)) = (&self.x, &self.y) else {
            return Vec::new();
        };

        x.iter()
            .zip(y.iter())
            .enumerate()
            .filter_map(|(i, (xv, yv))| {
                let yv = crate::models::value_number(yv)?;
                let xv = crate::models::value_number(xv).unwrap_or(i as f64);
                Some((xv, yv))
            })
            .collect()
    }
}

/// Colour of a marker: one for the whole trace or one per point
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkerColor {
    Single(Rgba),
    PerPoint(Vec<Rgba>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MarkerSize {
    Fixed(f64),
    PerPoint(Vec<Value>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Marker {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<MarkerColor>,
    /// Pie slices take their colours here rather than in `color`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<Rgba>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<MarkerSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizemode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizeref: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizemin: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Stroke>,
}

impl Marker {
    fn colored(color: MarkerColor) -> Self {
        Self {
            color: Some(color),
            ..Self::default()
        }
    }
}

/// Line styling for traces and marker outlines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<&'static str>,
}

impl Stroke {
    fn outline(color: Rgba, width: f64) -> Self {
        Self { color, width, shape: None }
    }

    fn linear(color: Rgba) -> Self {
        Self {
            color,
            width: 3.0,
            shape: Some("linear"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: Title,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hovermode: Option<&'static str>,
    pub showlegend: bool,
    pub margin: Margin,
    pub paper_bgcolor: Rgba,
    pub plot_bgcolor: Rgba,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Title {
    pub text: String,
    pub x: f64,
    pub xanchor: &'static str,
}

impl Title {
    fn centered(text: String) -> Self {
        Self {
            text,
            x: 0.5,
            xanchor: "center",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: AxisTitle,
    pub showgrid: bool,
    pub zeroline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisTitle {
    pub text: String,
}

impl Axis {
    fn titled(text: &str) -> Self {
        Self {
            title: AxisTitle { text: text.to_string() },
            showgrid: true,
            zeroline: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Margin {
    pub l: u16,
    pub r: u16,
    pub t: u16,
    pub b: u16,
}

/// Fixed interaction settings passed alongside every figure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotConfig {
    pub responsive: bool,
    pub display_mode_bar: bool,
    pub mode_bar_buttons_to_remove: Vec<&'static str>,
    pub displaylogo: bool,
    pub to_image_button_options: ImageExport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageExport {
    pub format: &'static str,
    pub filename: &'static str,
    pub height: u32,
    pub width: u32,
    pub scale: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            responsive: true,
            display_mode_bar: true,
            mode_bar_buttons_to_remove: vec!["pan2d", "lasso2d", "select2d", "autoScale2d"],
            displaylogo: false,
            to_image_button_options: ImageExport {
                format: "png",
                filename: "chart",
                height: 500,
                width: 1000,
                scale: 2,
            },
        }
    }
}

/// Build the figure for a chart
pub fn build_figure(chart: &Chart) -> Figure {
    let x_label = format_label(chart.x_label.as_deref().unwrap_or_default());
    let y_label = format_label(chart.y_label.as_deref().unwrap_or_default());

    match &chart.kind {
        ChartKind::Pie { values, labels } => pie_figure(values, labels, &y_label),
        ChartKind::Bubble { points, sizes } => {
            let mut figure = axes_figure(&x_label, &y_label);
            figure.data.push(bubble_trace(points, sizes, &x_label, &y_label));
            figure
        }
        ChartKind::Bar(points) => {
            let mut figure = axes_figure(&x_label, &y_label);
            figure.data.push(bar_trace(points, &x_label, &y_label));
            figure
        }
        ChartKind::Line(line) | ChartKind::MultiLine(line) => {
            let mut figure = axes_figure(&x_label, &y_label);
            if line.series.is_empty() {
                figure.data.push(area_trace(&line.points, &x_label, &y_label));
            } else {
                figure.layout.showlegend = true;
                figure.data.extend(series_traces(line, &x_label, &y_label));
            }
            figure
        }
        ChartKind::Scatter(points) | ChartKind::Other { points, .. } => {
            let mut figure = axes_figure(&x_label, &y_label);
            figure.data.push(scatter_trace(points, &x_label, &y_label));
            figure
        }
    }
}

fn hover_template(x_label: &str, y_label: &str) -> String {
    format!("<b>%{{text}}</b><br>{x_label}: %{{x}}<br>{y_label}: %{{y}}<extra></extra>")
}

fn pie_figure(values: &[Value], labels: &[String], y_label: &str) -> Figure {
    let title = if y_label.is_empty() { "Distribution" } else { y_label };

    let trace = Trace {
        values: Some(values.to_vec()),
        labels: Some(labels.to_vec()),
        textinfo: Some("label+percent"),
        textposition: Some("outside"),
        hovertemplate: Some(PIE_HOVER.to_string()),
        marker: Some(Marker {
            colors: Some(palette::gradient(labels.len())),
            line: Some(Stroke::outline(palette::OUTLINE, 2.0)),
            ..Marker::default()
        }),
        ..Trace::new(TraceType::Pie)
    };

    Figure {
        data: vec![trace],
        layout: Layout {
            title: Title::centered(title.to_string()),
            xaxis: None,
            yaxis: None,
            hovermode: None,
            showlegend: true,
            margin: Margin { l: 20, r: 20, t: 50, b: 20 },
            paper_bgcolor: palette::TRANSPARENT,
            plot_bgcolor: palette::PLOT_BACKGROUND,
        },
    }
}

/// Empty figure with the shared cartesian layout
fn axes_figure(x_label: &str, y_label: &str) -> Figure {
    Figure {
        data: Vec::new(),
        layout: Layout {
            title: Title::centered(format!("{y_label} vs {x_label}")),
            xaxis: Some(Axis::titled(x_label)),
            yaxis: Some(Axis::titled(y_label)),
            hovermode: Some("closest"),
            showlegend: false,
            margin: Margin { l: 70, r: 30, t: 50, b: 70 },
            paper_bgcolor: palette::TRANSPARENT,
            plot_bgcolor: palette::PLOT_BACKGROUND,
        },
    }
}

fn bubble_trace(points: &Points, sizes: &[Value], x_label: &str, y_label: &str) -> Trace {
    Trace {
        mode: Some(TraceMode::Markers),
        text: points.labels.clone(),
        hovertemplate: Some(hover_template(x_label, y_label)),
        marker: Some(Marker {
            size: Some(MarkerSize::PerPoint(sizes.to_vec())),
            sizemode: Some("diameter"),
            sizeref: Some(2.0),
            sizemin: Some(4.0),
            opacity: Some(0.7),
            line: Some(Stroke::outline(palette::PRIMARY_SOLID, 2.0)),
            ..Marker::colored(MarkerColor::Single(palette::PRIMARY))
        }),
        ..Trace::xy(TraceType::Scatter, &points.x, &points.y)
    }
}

fn bar_trace(points: &Points, x_label: &str, y_label: &str) -> Trace {
    let color = if points.y.len() < 2 {
        MarkerColor::Single(palette::PRIMARY)
    } else {
        MarkerColor::PerPoint(palette::gradient(points.y.len()))
    };

    Trace {
        text: Some(points.labels.clone().unwrap_or_default()),
        textposition: Some("outside"),
        hovertemplate: Some(hover_template(x_label, y_label)),
        marker: Some(Marker {
            opacity: Some(0.9),
            line: Some(Stroke::outline(palette::PRIMARY_SOLID, 1.5)),
            ..Marker::colored(color)
        }),
        ..Trace::xy(TraceType::Bar, &points.x, &points.y)
    }
}

fn series_traces<'a>(
    line: &'a LineData,
    x_label: &'a str,
    y_label: &'a str,
) -> impl Iterator<Item = Trace> + 'a {
    line.series.iter().enumerate().map(move |(idx, series)| {
        let color = palette::series_color(idx);
        Trace {
            mode: Some(TraceMode::LinesMarkers),
            name: Some(
                series
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Series {}", idx + 1)),
            ),
            text: series.labels.clone(),
            hovertemplate: Some(hover_template(x_label, y_label)),
            line: Some(Stroke::linear(color)),
            marker: Some(Marker {
                size: Some(MarkerSize::Fixed(7.0)),
                line: Some(Stroke::outline(palette::OUTLINE, 2.0)),
                ..Marker::colored(MarkerColor::Single(color))
            }),
            fill: Some(Fill::None),
            ..Trace::xy(TraceType::Scatter, &series.x, &series.y)
        }
    })
}

fn area_trace(points: &Points, x_label: &str, y_label: &str) -> Trace {
    Trace {
        mode: Some(TraceMode::LinesMarkers),
        text: Some(points.labels.clone().unwrap_or_default()),
        hovertemplate: Some(hover_template(x_label, y_label)),
        line: Some(Stroke::linear(palette::PRIMARY_SOLID)),
        marker: Some(Marker {
            size: Some(MarkerSize::Fixed(8.0)),
            line: Some(Stroke::outline(palette::OUTLINE, 2.0)),
            ..Marker::colored(MarkerColor::Single(palette::PRIMARY_SOLID))
        }),
        fill: Some(Fill::ToNextY),
        fillcolor: Some(palette::PRIMARY_FILL),
        ..Trace::xy(TraceType::Scatter, &points.x, &points.y)
    }
}

fn scatter_trace(points: &Points, x_label: &str, y_label: &str) -> Trace {
    Trace {
        mode: Some(TraceMode::Markers),
        text: points.labels.clone(),
        hovertemplate: Some(hover_template(x_label, y_label)),
        marker: Some(Marker {
            size: Some(MarkerSize::Fixed(10.0)),
            opacity: Some(0.8),
            line: Some(Stroke::outline(palette::PRIMARY_SOLID, 2.0)),
            ..Marker::colored(MarkerColor::Single(palette::PRIMARY))
        }),
        ..Trace::xy(TraceType::Scatter, &points.x, &points.y)
    }
}

/// Labels to show along the x axis of a trace, as display text
pub fn x_tick_labels(trace: &Trace) -> Vec<String> {
    trace
        .x
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(value_text)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart(value: Value) -> Chart {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn pie_produces_one_pie_trace() {
        let figure = build_figure(&chart(json!({
            "chartType": "pie",
            "values": [1, 2, 3],
            "labels": ["a", "b", "c"]
        })));

        assert_eq!(figure.data.len(), 1);
        let trace = &figure.data[0];
        assert_eq!(trace.trace_type, TraceType::Pie);
        assert_eq!(trace.marker.as_ref().unwrap().colors.as_ref().unwrap().len(), 3);
        assert_eq!(figure.layout.title.text, "Distribution");
        assert!(figure.layout.showlegend);
        assert!(figure.layout.xaxis.is_none());
    }

    #[test]
    fn pie_title_uses_y_label() {
        let figure = build_figure(&chart(json!({
            "chartType": "pie",
            "values": [5],
            "labels": ["Big Ten"],
            "yLabel": "conference_share"
        })));
        assert_eq!(figure.layout.title.text, "Conference Share");
    }

    #[test]
    fn multi_line_series_get_distinct_colours() {
        let figure = build_figure(&chart(json!({
            "chartType": "multi_line",
            "series": [{"x": [1, 2], "y": [3, 4]}, {"x": [1, 2], "y": [5, 6], "name": "Kansas"}]
        })));

        assert_eq!(figure.data.len(), 2);
        let first = figure.data[0].line.as_ref().unwrap().color;
        let second = figure.data[1].line.as_ref().unwrap().color;
        assert_ne!(first, second);
        assert_eq!(figure.data[0].name.as_deref(), Some("Series 1"));
        assert_eq!(figure.data[1].name.as_deref(), Some("Kansas"));
        assert!(figure.layout.showlegend);
    }

    #[test]
    fn seventh_series_wraps_to_first_colour() {
        let series: Vec<Value> = (0..7).map(|_| json!({"x": [1], "y": [1]})).collect();
        let figure = build_figure(&chart(json!({ "chartType": "line", "series": series })));
        assert_eq!(figure.data.len(), 7);
        assert_eq!(figure.data[6].line, figure.data[0].line);
    }

    #[test]
    fn line_without_series_is_a_filled_area() {
        let figure = build_figure(&chart(json!({
            "chartType": "line",
            "x": ["2021", "2022"],
            "y": [20, 25],
            "series": []
        })));

        assert_eq!(figure.data.len(), 1);
        assert_eq!(figure.data[0].fill, Some(Fill::ToNextY));
        assert_eq!(figure.data[0].mode, Some(TraceMode::LinesMarkers));
        assert!(!figure.layout.showlegend);
    }

    #[test]
    fn bar_colours_follow_the_gradient() {
        let figure = build_figure(&chart(json!({
            "chartType": "bar",
            "x": ["a", "b", "c"],
            "y": [1, 2, 3],
            "xLabel": "team_name",
            "yLabel": "total_wins"
        })));

        let trace = &figure.data[0];
        assert_eq!(trace.trace_type, TraceType::Bar);
        match &trace.marker.as_ref().unwrap().color {
            Some(MarkerColor::PerPoint(colors)) => assert_eq!(colors, &palette::gradient(3)),
            other => panic!("unexpected colour {other:?}"),
        }
        assert_eq!(figure.layout.title.text, "Total Wins vs Team Name");
        assert_eq!(figure.layout.xaxis.as_ref().unwrap().title.text, "Team Name");
    }

    #[test]
    fn single_bar_is_flat_coloured() {
        let figure = build_figure(&chart(json!({ "chartType": "bar", "x": ["a"], "y": [1] })));
        assert_eq!(
            figure.data[0].marker.as_ref().unwrap().color,
            Some(MarkerColor::Single(palette::PRIMARY))
        );
    }

    #[test]
    fn bubble_sizes_are_diameters() {
        let figure = build_figure(&chart(json!({
            "chartType": "bubble",
            "x": [1, 2],
            "y": [3, 4],
            "sizes": [10, 40],
            "labels": ["Duke", "UNC"]
        })));

        let trace = &figure.data[0];
        assert_eq!(trace.mode, Some(TraceMode::Markers));
        let marker = trace.marker.as_ref().unwrap();
        assert_eq!(marker.size, Some(MarkerSize::PerPoint(vec![json!(10), json!(40)])));
        assert_eq!(marker.sizemode, Some("diameter"));
        assert_eq!(marker.sizeref, Some(2.0));
    }

    #[test]
    fn unknown_type_falls_back_to_scatter() {
        let figure = build_figure(&chart(json!({ "chartType": "radar", "x": [1], "y": [2] })));
        assert_eq!(figure.data.len(), 1);
        assert_eq!(figure.data[0].trace_type, TraceType::Scatter);
        assert_eq!(figure.data[0].mode, Some(TraceMode::Markers));
    }

    #[test]
    fn serializes_as_plotly_json() {
        let figure = build_figure(&chart(json!({
            "chartType": "line",
            "series": [{"x": [1], "y": [2]}]
        })));
        let json = serde_json::to_value(&figure).unwrap();

        assert_eq!(json["data"][0]["type"], "scatter");
        assert_eq!(json["data"][0]["mode"], "lines+markers");
        assert_eq!(json["data"][0]["line"]["color"], "rgba(255, 107, 53, 1)");
        assert_eq!(json["data"][0]["fill"], "none");
        assert_eq!(json["layout"]["hovermode"], "closest");

        let config = serde_json::to_value(PlotConfig::default()).unwrap();
        assert_eq!(config["displaylogo"], false);
        assert_eq!(config["modeBarButtonsToRemove"][1], "lasso2d");
        assert_eq!(config["toImageButtonOptions"]["format"], "png");
    }

    #[test]
    fn numeric_points_use_index_for_categorical_x() {
        let trace = Trace::xy(
            TraceType::Scatter,
            &[json!("Duke"), json!("UNC"), json!("Kansas")],
            &[json!(3), json!(null), json!(5)],
        );
        assert_eq!(trace.numeric_points(), vec![(0.0, 3.0), (2.0, 5.0)]);
    }
}

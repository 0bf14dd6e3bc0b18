use crate::render::figure::{x_tick_labels, Figure, MarkerColor, PlotConfig, Trace, TraceMode, TraceType};
use crate::render::palette::{self, Rgba};
use crate::models::value_text;
use anyhow::{Context, Result};
use ratatui::{
    buffer::Buffer,
    layout::{Direction, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis as AxisWidget, Bar, BarChart, BarGroup, Block, Borders, Chart as ChartWidget, Dataset,
        GraphType, Paragraph, Widget,
    },
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Anything that can draw or store a finished figure
pub trait PlotSink {
    fn plot(&mut self, figure: &Figure, config: &PlotConfig) -> Result<()>;
}

/// Output format of an exported chart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Standalone page that loads Plotly and draws the figure
    Html,
    /// `{ data, layout, config }` as JSON
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Html,
        }
    }
}

/// Writes figures to a file on disk
pub struct FileExport {
    path: PathBuf,
}

impl FileExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PlotSink for FileExport {
    fn plot(&mut self, figure: &Figure, config: &PlotConfig) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).context("Failed to create export directory")?;
        }

        let content = match ExportFormat::from_path(&self.path) {
            ExportFormat::Html => html_page(figure, config)?,
            ExportFormat::Json => figure_json(figure, config)?,
        };

        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::info!(path = %self.path.display(), "Exported chart");
        Ok(())
    }
}

/// Streams the figure JSON to any writer (stdout for the CLI)
pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> PlotSink for JsonWriter<W> {
    fn plot(&mut self, figure: &Figure, config: &PlotConfig) -> Result<()> {
        writeln!(self.writer, "{}", figure_json(figure, config)?)?;
        Ok(())
    }
}

fn figure_json(figure: &Figure, config: &PlotConfig) -> Result<String> {
    let document = serde_json::json!({
        "data": figure.data,
        "layout": figure.layout,
        "config": config,
    });
    serde_json::to_string_pretty(&document).context("Failed to serialize figure")
}

fn html_page(figure: &Figure, config: &PlotConfig) -> Result<String> {
    let data = script_safe(serde_json::to_string(&figure.data)?);
    let layout = script_safe(serde_json::to_string(&figure.layout)?);
    let config = script_safe(serde_json::to_string(config)?);
    let title = html_escape(&figure.layout.title.text);

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:90vh;"></div>
<script>
Plotly.newPlot("chart", {data}, {layout}, {config});
window.addEventListener("resize", () => Plotly.Plots.resize("chart"));
</script>
</body>
</html>
"#
    ))
}

fn script_safe(json: String) -> String {
    json.replace("</", "<\\/")
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Draws a figure with terminal widgets: bars for bar and pie traces, a line/scatter canvas otherwise
pub struct TerminalPlot<'a> {
    figure: &'a Figure,
}

impl<'a> TerminalPlot<'a> {
    pub fn new(figure: &'a Figure) -> Self {
        Self { figure }
    }
}

impl Widget for TerminalPlot<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("📈 {}", self.figure.layout.title.text.trim()));

        match self.figure.data.first().map(|t| t.trace_type) {
            Some(TraceType::Pie) => render_pie(&self.figure.data[0], block, area, buf),
            Some(TraceType::Bar) => render_bars(&self.figure.data[0], block, area, buf),
            Some(TraceType::Scatter) => render_xy(self.figure, block, area, buf),
            None => Paragraph::new("No chart data").block(block).render(area, buf),
        }
    }
}

fn render_pie(trace: &Trace, block: Block, area: Rect, buf: &mut Buffer) {
    let labels = trace.labels.clone().unwrap_or_default();
    let values: Vec<f64> = trace
        .values
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|v| crate::models::value_number(v).unwrap_or(0.0).max(0.0))
        .collect();
    let total: f64 = values.iter().sum();
    let colors = trace
        .marker
        .as_ref()
        .and_then(|m| m.colors.clone())
        .unwrap_or_default();

    let bars: Vec<Bar> = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let share = if total > 0.0 { value / total * 100.0 } else { 0.0 };
            let color = colors.get(i).copied().unwrap_or(palette::PRIMARY);
            Bar::default()
                .label(Line::from(labels.get(i).cloned().unwrap_or_default()))
                .value((share * 10.0).round() as u64)
                .text_value(format!("{share:.1}%"))
                .style(Style::default().fg(color.into()))
        })
        .collect();

    horizontal_bars(bars, 1000, block, area, buf);
}

fn render_bars(trace: &Trace, block: Block, area: Rect, buf: &mut Buffer) {
    let labels = x_tick_labels(trace);
    let raw = trace.y.as_deref().unwrap_or_default();
    let values: Vec<f64> = raw
        .iter()
        .map(|v| crate::models::value_number(v).unwrap_or(0.0).max(0.0))
        .collect();
    let max = values.iter().cloned().fold(0.0_f64, f64::max);
    let scale = if max > 0.0 { 1000.0 / max } else { 0.0 };
    let colors: Vec<Rgba> = match trace.marker.as_ref().and_then(|m| m.color.clone()) {
        Some(MarkerColor::PerPoint(colors)) => colors,
        Some(MarkerColor::Single(color)) => vec![color; values.len()],
        None => vec![palette::PRIMARY; values.len()],
    };

    let bars: Vec<Bar> = values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let color = colors.get(i).copied().unwrap_or(palette::PRIMARY);
            Bar::default()
                .label(Line::from(labels.get(i).cloned().unwrap_or_default()))
                .value((value * scale).round() as u64)
                .text_value(raw.get(i).map(value_text).unwrap_or_default())
                .style(Style::default().fg(color.into()))
        })
        .collect();

    horizontal_bars(bars, 1000, block, area, buf);
}

fn horizontal_bars(bars: Vec<Bar>, max: u64, block: Block, area: Rect, buf: &mut Buffer) {
    let gap = if (bars.len() as u16) * 2 <= area.height.saturating_sub(2) { 1 } else { 0 };
    BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(gap)
        .max(max)
        .data(BarGroup::default().bars(&bars))
        .render(area, buf);
}

struct XySeries {
    name: String,
    points: Vec<(f64, f64)>,
    color: Color,
    graph_type: GraphType,
}

fn trace_color(trace: &Trace) -> Rgba {
    if let Some(line) = &trace.line {
        return line.color;
    }
    match trace.marker.as_ref().and_then(|m| m.color.as_ref()) {
        Some(MarkerColor::Single(color)) => *color,
        Some(MarkerColor::PerPoint(colors)) => colors.first().copied().unwrap_or(palette::PRIMARY),
        None => palette::PRIMARY,
    }
}

fn render_xy(figure: &Figure, block: Block, area: Rect, buf: &mut Buffer) {
    let series: Vec<XySeries> = figure
        .data
        .iter()
        .enumerate()
        .map(|(i, trace)| XySeries {
            name: trace.name.clone().unwrap_or_else(|| format!("Series {}", i + 1)),
            points: trace.numeric_points(),
            color: trace_color(trace).into(),
            graph_type: match trace.mode {
                Some(TraceMode::LinesMarkers) => GraphType::Line,
                _ => GraphType::Scatter,
            },
        })
        .collect();

    let all = series.iter().flat_map(|s| s.points.iter());
    let (x_bounds, y_bounds) = bounds(all);

    let datasets: Vec<Dataset> = series
        .iter()
        .map(|s| {
            Dataset::default()
                .name(s.name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(s.graph_type)
                .style(Style::default().fg(s.color))
                .data(&s.points)
        })
        .collect();

    let x_title = figure
        .layout
        .xaxis
        .as_ref()
        .map(|a| a.title.text.clone())
        .unwrap_or_default();
    let y_title = figure
        .layout
        .yaxis
        .as_ref()
        .map(|a| a.title.text.clone())
        .unwrap_or_default();

    let x_labels = match figure.data.first() {
        Some(trace) if is_categorical(trace) => {
            let ticks = x_tick_labels(trace);
            vec![
                Span::raw(ticks.first().cloned().unwrap_or_default()),
                Span::raw(ticks.last().cloned().unwrap_or_default()),
            ]
        }
        _ => axis_labels(x_bounds),
    };

    let mut chart = ChartWidget::new(datasets)
        .block(block)
        .x_axis(
            AxisWidget::default()
                .title(x_title)
                .style(Style::default().fg(Color::Gray))
                .bounds(x_bounds)
                .labels(x_labels),
        )
        .y_axis(
            AxisWidget::default()
                .title(y_title)
                .style(Style::default().fg(Color::Gray))
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds)),
        );

    if !figure.layout.showlegend {
        chart = chart.legend_position(None);
    }

    chart.render(area, buf);
}

fn is_categorical(trace: &Trace) -> bool {
    trace
        .x
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|v| crate::models::value_number(v).is_none())
}

/// Axis bounds over all points, padded so flat data still has height
fn bounds<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> ([f64; 2], [f64; 2]) {
    let mut x = [f64::INFINITY, f64::NEG_INFINITY];
    let mut y = [f64::INFINITY, f64::NEG_INFINITY];
    for (px, py) in points {
        x = [x[0].min(*px), x[1].max(*px)];
        y = [y[0].min(*py), y[1].max(*py)];
    }
    (pad_bounds(x), pad_bounds(y))
}

fn pad_bounds([lo, hi]: [f64; 2]) -> [f64; 2] {
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if (hi - lo).abs() < f64::EPSILON {
        return [lo - 1.0, hi + 1.0];
    }
    [lo, hi]
}

fn axis_labels([lo, hi]: [f64; 2]) -> Vec<Span<'static>> {
    [lo, (lo + hi) / 2.0, hi]
        .iter()
        .map(|v| Span::raw(format_tick(*v)))
        .collect()
}

fn format_tick(value: f64) -> String {
    if value.fract().abs() < 1e-9 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chart;
    use crate::render::figure::build_figure;
    use serde_json::json;

    fn figure(value: serde_json::Value) -> Figure {
        let chart: Chart = serde_json::from_value(value).unwrap();
        build_figure(&chart)
    }

    #[test]
    fn export_format_follows_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("a/chart.json")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("a/chart.JSON")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("chart.html")), ExportFormat::Html);
        assert_eq!(ExportFormat::from_path(Path::new("chart")), ExportFormat::Html);
    }

    #[test]
    fn writes_html_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wins.html");
        let mut sink = FileExport::new(&path);
        sink.plot(
            &figure(json!({ "chartType": "bar", "x": ["</script>"], "y": [3] })),
            &PlotConfig::default(),
        )
        .unwrap();

        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("Plotly.newPlot"));
        assert!(html.contains(PLOTLY_CDN));
        assert!(!html.contains("\"</script>\""));
    }

    #[test]
    fn writes_json_document() {
        let mut sink = JsonWriter::new(Vec::new());
        sink.plot(
            &figure(json!({ "chartType": "pie", "values": [1, 1], "labels": ["a", "b"] })),
            &PlotConfig::default(),
        )
        .unwrap();

        let out: serde_json::Value = serde_json::from_slice(&sink.into_inner()).unwrap();
        assert_eq!(out["data"][0]["type"], "pie");
        assert_eq!(out["config"]["responsive"], true);
    }

    #[test]
    fn terminal_plot_draws_every_kind() {
        let charts = [
            json!({ "chartType": "pie", "values": [3, 1], "labels": ["Big 12", "SEC"] }),
            json!({ "chartType": "bar", "x": ["Duke", "UNC"], "y": [30, 25] }),
            json!({ "chartType": "line", "x": [2020, 2021], "y": [10, 12] }),
            json!({ "chartType": "multi_line", "series": [{"x": [1, 2], "y": [1, 2]}, {"x": [1, 2], "y": [2, 1]}] }),
            json!({ "chartType": "bubble", "x": [1, 2], "y": [1, 2], "sizes": [5, 9] }),
            json!({ "chartType": "scatter", "x": [], "y": [] }),
        ];

        for chart in charts {
            let figure = figure(chart);
            let area = Rect::new(0, 0, 60, 20);
            let mut buf = Buffer::empty(area);
            TerminalPlot::new(&figure).render(area, &mut buf);
        }
    }

    #[test]
    fn bounds_pad_flat_and_empty_data() {
        let flat = [(1.0, 5.0), (2.0, 5.0)];
        let (x, y) = bounds(flat.iter());
        assert_eq!(x, [1.0, 2.0]);
        assert_eq!(y, [4.0, 6.0]);

        let (x, y) = bounds([].iter());
        assert_eq!(x, [0.0, 1.0]);
        assert_eq!(y, [0.0, 1.0]);
    }

    #[test]
    fn ticks_drop_needless_decimals() {
        assert_eq!(format_tick(12.0), "12");
        assert_eq!(format_tick(0.456), "0.46");
    }
}

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Answer returned by the query service for a single question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,

    #[serde(rename = "tableData", default, skip_serializing_if = "Option::is_none")]
    pub table: Option<Table>,

    /// Shared so chart views can tell a new chart from the one they already drew
    #[serde(rename = "graphData", default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<Arc<Chart>>,
}

/// Tabular result; rows are not guaranteed to match the column count
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rows: Vec<Vec<Value>>,
}

/// Chart payload with its axis labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ChartPayload", into = "ChartPayload")]
pub struct Chart {
    pub kind: ChartKind,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
}

/// Tag-dependent chart data
#[derive(Debug, Clone, PartialEq)]
pub enum ChartKind {
    Bar(Points),
    Line(LineData),
    MultiLine(LineData),
    Pie { values: Vec<Value>, labels: Vec<String> },
    Bubble { points: Points, sizes: Vec<Value> },
    Scatter(Points),
    /// A tag this client does not know; drawn as a plain scatter
    Other { chart_type: String, points: Points },
}

/// Paired x/y samples with optional per-point labels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Points {
    pub x: Vec<Value>,
    pub y: Vec<Value>,
    pub labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineData {
    pub points: Points,
    pub series: Vec<Series>,
}

/// One named line of a multi-line chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub x: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub y: Vec<Value>,
    #[serde(
        default,
        deserialize_with = "lenient_labels",
        skip_serializing_if = "Option::is_none"
    )]
    pub labels: Option<Vec<String>>,
}

impl Chart {
    /// Wire name of the chart type
    pub fn chart_type(&self) -> &str {
        match &self.kind {
            ChartKind::Bar(_) => "bar",
            ChartKind::Line(_) => "line",
            ChartKind::MultiLine(_) => "multi_line",
            ChartKind::Pie { .. } => "pie",
            ChartKind::Bubble { .. } => "bubble",
            ChartKind::Scatter(_) => "scatter",
            ChartKind::Other { chart_type, .. } => chart_type,
        }
    }
}

/// Flat wire shape of `graphData`; every tag-specific field is optional here
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    chart_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sizes: Option<Vec<Value>>,
    #[serde(
        default,
        deserialize_with = "lenient_labels",
        skip_serializing_if = "Option::is_none"
    )]
    labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    x_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    y_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    series: Option<Vec<Series>>,
}

impl ChartPayload {
    fn take_points(&mut self) -> Points {
        Points {
            x: self.x.take().unwrap_or_default(),
            y: self.y.take().unwrap_or_default(),
            labels: self.labels.take(),
        }
    }

    fn take_line(&mut self) -> LineData {
        LineData {
            series: self.series.take().unwrap_or_default(),
            points: self.take_points(),
        }
    }

    fn put_points(&mut self, points: Points) {
        self.x = Some(points.x);
        self.y = Some(points.y);
        self.labels = points.labels;
    }
}

impl From<ChartPayload> for Chart {
    fn from(mut payload: ChartPayload) -> Self {
        let kind = match payload.chart_type.as_str() {
            "bar" => ChartKind::Bar(payload.take_points()),
            "line" => ChartKind::Line(payload.take_line()),
            "multi_line" => ChartKind::MultiLine(payload.take_line()),
            "pie" => ChartKind::Pie {
                values: payload.values.take().unwrap_or_default(),
                labels: payload.labels.take().unwrap_or_default(),
            },
            "bubble" => ChartKind::Bubble {
                sizes: payload.sizes.take().unwrap_or_default(),
                points: payload.take_points(),
            },
            "scatter" => ChartKind::Scatter(payload.take_points()),
            _ => ChartKind::Other {
                chart_type: std::mem::take(&mut payload.chart_type),
                points: payload.take_points(),
            },
        };

        Chart {
            kind,
            x_label: payload.x_label,
            y_label: payload.y_label,
        }
    }
}

impl From<Chart> for ChartPayload {
    fn from(chart: Chart) -> Self {
        let mut payload = ChartPayload {
            chart_type: chart.chart_type().to_string(),
            x_label: chart.x_label,
            y_label: chart.y_label,
            ..Default::default()
        };

        match chart.kind {
            ChartKind::Bar(points) | ChartKind::Scatter(points) => payload.put_points(points),
            ChartKind::Other { points, .. } => payload.put_points(points),
            ChartKind::Line(line) | ChartKind::MultiLine(line) => {
                payload.put_points(line.points);
                if !line.series.is_empty() {
                    payload.series = Some(line.series);
                }
            }
            ChartKind::Pie { values, labels } => {
                payload.values = Some(values);
                payload.labels = Some(labels);
            }
            ChartKind::Bubble { points, sizes } => {
                payload.put_points(points);
                payload.sizes = Some(sizes);
            }
        }

        payload
    }
}

/// Accept label arrays containing numbers or nulls as well as strings
fn lenient_labels<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|values| values.iter().map(value_text).collect()))
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Display text for a loosely typed cell or axis value
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric reading of a loosely typed value, accepting numeric strings
pub fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Summary returned by the bulk query-processing endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessQueriesResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub original_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub duplicates_removed: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub final_count: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub queries_processed: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub queries_succeeded: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub queries_failed: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub processing_time_ms: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub errors: Vec<String>,
}

/// A single entry in the conversation
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub text: String,
    pub is_user: bool,
    pub response: Option<Response>,
    pub time_taken_ms: Option<u64>,
    pub timestamp: DateTime<Local>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
            response: None,
            time_taken_ms: None,
            timestamp: Local::now(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            is_user: false,
            ..Self::user(text)
        }
    }

    pub fn with_response(mut self, response: Response) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_time_taken(mut self, millis: u64) -> Self {
        self.time_taken_ms = Some(millis);
        self
    }

    pub fn chart(&self) -> Option<&Arc<Chart>> {
        self.response.as_ref()?.chart.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_full_response() {
        let body = json!({
            "message": "Top scorers",
            "tableData": { "columns": ["team", "pts"], "rows": [["Duke", 81], ["UNC"]] },
            "graphData": { "chartType": "bar", "x": ["Duke", "UNC"], "y": [81, 77], "xLabel": "team", "yLabel": "points" }
        });
        let response: Response = serde_json::from_value(body).unwrap();

        assert_eq!(response.message, "Top scorers");
        let table = response.table.unwrap();
        assert_eq!(table.columns, vec!["team", "pts"]);
        assert_eq!(table.rows[1].len(), 1);

        let chart = response.chart.unwrap();
        assert_eq!(chart.chart_type(), "bar");
        assert_eq!(chart.x_label.as_deref(), Some("team"));
        match &chart.kind {
            ChartKind::Bar(points) => {
                assert_eq!(points.x.len(), 2);
                assert_eq!(points.y, vec![json!(81), json!(77)]);
                assert!(points.labels.is_none());
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn message_only_response_has_no_artifacts() {
        let response: Response = serde_json::from_str(r#"{"message":"No data"}"#).unwrap();
        assert!(response.table.is_none());
        assert!(response.chart.is_none());
    }

    #[test]
    fn unknown_chart_type_keeps_points() {
        let chart: Chart =
            serde_json::from_value(json!({ "chartType": "heatmap", "x": [1, 2], "y": [3, 4] })).unwrap();
        match chart.kind {
            ChartKind::Other { chart_type, points } => {
                assert_eq!(chart_type, "heatmap");
                assert_eq!(points.y, vec![json!(3), json!(4)]);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn multi_line_without_series_falls_back_to_points() {
        let chart: Chart =
            serde_json::from_value(json!({ "chartType": "multi_line", "x": [1], "y": [2] })).unwrap();
        match chart.kind {
            ChartKind::MultiLine(line) => {
                assert!(line.series.is_empty());
                assert_eq!(line.points.x, vec![json!(1)]);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn labels_accept_non_string_values() {
        let chart: Chart = serde_json::from_value(json!({
            "chartType": "pie",
            "values": [1, 2, 3],
            "labels": ["a", 2023, null]
        }))
        .unwrap();
        match chart.kind {
            ChartKind::Pie { labels, .. } => assert_eq!(labels, vec!["a", "2023", ""]),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn chart_serializes_back_to_wire_shape() {
        let chart: Chart = serde_json::from_value(json!({
            "chartType": "bubble",
            "x": [1],
            "y": [2],
            "sizes": [30],
            "yLabel": "wins"
        }))
        .unwrap();
        let wire = serde_json::to_value(&chart).unwrap();
        assert_eq!(wire["chartType"], "bubble");
        assert_eq!(wire["sizes"], json!([30]));
        assert_eq!(wire["yLabel"], "wins");
        assert!(wire.get("series").is_none());
    }

    #[test]
    fn process_summary_defaults_missing_fields() {
        let summary: ProcessQueriesResponse =
            serde_json::from_str(r#"{"originalCount": 12, "errors": ["timeout"]}"#).unwrap();
        assert_eq!(summary.original_count, 12);
        assert_eq!(summary.queries_failed, 0);
        assert_eq!(summary.processing_time_ms, 0);
        assert_eq!(summary.errors, vec!["timeout"]);
    }

    #[test]
    fn null_fields_read_as_empty() {
        let summary: ProcessQueriesResponse = serde_json::from_str(
            r#"{"originalCount": 3, "queriesFailed": null, "processingTimeMs": null, "errors": null}"#,
        )
        .unwrap();
        assert_eq!(summary.original_count, 3);
        assert_eq!(summary.queries_failed, 0);
        assert_eq!(summary.processing_time_ms, 0);
        assert!(summary.errors.is_empty());

        let response: Response = serde_json::from_value(json!({
            "message": null,
            "tableData": { "columns": ["team"], "rows": null },
            "graphData": { "chartType": "multi_line", "series": [{ "name": "Duke", "x": null, "y": [1] }] }
        }))
        .unwrap();
        assert_eq!(response.message, "");
        assert!(response.table.unwrap().rows.is_empty());
        match &response.chart.unwrap().kind {
            ChartKind::MultiLine(line) => assert!(line.series[0].x.is_empty()),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn value_helpers() {
        assert_eq!(value_text(&json!("Duke")), "Duke");
        assert_eq!(value_text(&json!(12.5)), "12.5");
        assert_eq!(value_text(&Value::Null), "");
        assert_eq!(value_number(&json!("3.5")), Some(3.5));
        assert_eq!(value_number(&json!(true)), None);
    }
}

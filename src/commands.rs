use anyhow::{Context, Result};
use crate::config::Config;
use crate::models::{Chart, Response};
use crate::render::{build_figure, export_chart, format_label, JsonWriter, PlotConfig, PlotSink, TableView};
use crate::service::{HttpQueryService, QueryService};
use crate::ui::conversation::summary::{format_time, process_summary};
use std::io;
use std::path::{Path, PathBuf};
use tokio::time::Instant;

/// Ask a single question and print the answer
pub async fn ask(config: &Config, query: &str, json: bool, export: Option<PathBuf>) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        println!("❌ Nothing to ask: the query is empty.");
        return Ok(());
    }

    let service = HttpQueryService::new(config)?;
    let started = Instant::now();
    let response = service
        .ask(query)
        .await
        .with_context(|| format!("Query failed: {query}"))?;
    let elapsed = started.elapsed().as_millis() as u64;
    tracing::info!(query, elapsed_ms = elapsed, "Query answered");

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", response_text(&response));
        println!("⏱  {}", format_time(elapsed));
    }

    if let Some(path) = export {
        match &response.chart {
            Some(chart) => {
                export_chart(chart, &path)?;
                println!("📁 Chart exported to {}", path.display());
            }
            None => println!("ℹ️  The answer has no chart to export."),
        }
    }

    Ok(())
}

/// Run the stored-query batch job and print its statistics
pub async fn process(config: &Config) -> Result<()> {
    let service = HttpQueryService::new(config)?;

    println!("⚙️  Processing stored queries...");
    let started = Instant::now();
    let summary = service
        .process_queries()
        .await
        .context("Error processing queries")?;

    let (message, _) = process_summary(&summary, started.elapsed().as_millis() as u64);
    println!("{message}");
    Ok(())
}

/// Build the figure for a saved response (or bare chart) and print it as JSON
pub fn chart(path: &Path, export: Option<PathBuf>) -> Result<()> {
    let chart = load_chart(path)?;

    let mut writer = JsonWriter::new(io::stdout().lock());
    writer.plot(&build_figure(&chart), &PlotConfig::default())?;

    if let Some(export) = export {
        export_chart(&chart, &export)?;
        eprintln!("📁 Chart exported to {}", export.display());
    }

    Ok(())
}

/// Print the effective configuration, or just where it lives
pub fn show_config(config: &Config, path_only: bool) -> Result<()> {
    if path_only {
        println!("{}", config.config_path().display());
        return Ok(());
    }

    println!("📍 {}", config.config_path().display());
    println!("🔗 Chat endpoint: {}", config.chat_url());
    println!("🔗 Process endpoint: {}", config.process_url());
    println!("{}", "=".repeat(50));
    print!("{}", toml::to_string_pretty(config).context("Failed to serialize config")?);
    Ok(())
}

/// Read a chart from a JSON file holding either a full response or `graphData` alone
fn load_chart(path: &Path) -> Result<Chart> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))?;

    if value.get("chartType").is_some() {
        return serde_json::from_value(value).context("Failed to parse chart");
    }

    let response: Response = serde_json::from_value(value).context("Failed to parse response")?;
    let chart = response
        .chart
        .with_context(|| format!("{} has no graphData", path.display()))?;
    Ok(Chart::clone(&chart))
}

/// Plain-text rendering of an answer: message, table, chart summary
fn response_text(response: &Response) -> String {
    let mut out = String::new();

    if !response.message.is_empty() {
        out.push_str(&response.message);
        out.push_str("\n\n");
    }

    if let Some(table) = &response.table {
        out.push_str(&TableView::new(table).to_plain_text());
        out.push('\n');
    }

    if let Some(chart) = &response.chart {
        let figure = build_figure(chart);
        out.push_str(&format!(
            "📈 {} chart: {} ({} trace{})\n",
            format_label(chart.chart_type()),
            figure.layout.title.text,
            figure.data.len(),
            if figure.data.len() == 1 { "" } else { "s" }
        ));
    }

    out
}

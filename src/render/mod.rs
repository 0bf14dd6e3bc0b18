//! Response rendering: tables, chart figures, and the sinks that draw them

pub mod figure;
pub mod label;
pub mod palette;
pub mod plot;
pub mod resize;
pub mod table;
pub mod view;

pub use figure::{build_figure, Figure, PlotConfig};
pub use label::format_label;
pub use plot::{ExportFormat, FileExport, JsonWriter, PlotSink, TerminalPlot};
pub use resize::{ResizeHub, ResizeSubscription};
pub use table::TableView;
pub use view::ChartView;

use crate::models::Chart;
use anyhow::Result;
use std::path::Path;

/// Build the figure for `chart` and write it to `path` (HTML, or JSON for `.json`)
pub fn export_chart(chart: &Chart, path: &Path) -> Result<()> {
    FileExport::new(path).plot(&build_figure(chart), &PlotConfig::default())
}

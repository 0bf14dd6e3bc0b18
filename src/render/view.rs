use crate::models::Chart;
use crate::render::figure::{build_figure, Figure, PlotConfig};
use crate::render::plot::{PlotSink, TerminalPlot};
use crate::render::resize::ResizeSubscription;
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};
use std::sync::Arc;

/// Holds the chart currently on screen and its figure.
///
/// The figure is rebuilt from scratch whenever a different chart is set; the
/// same `Arc` set twice is a no-op. The resize subscription lives exactly as
/// long as the view.
pub struct ChartView {
    chart: Option<Arc<Chart>>,
    figure: Option<Figure>,
    config: PlotConfig,
    builds: usize,
    resize: ResizeSubscription,
    needs_redraw: bool,
}

impl ChartView {
    pub fn new(resize: ResizeSubscription) -> Self {
        Self {
            chart: None,
            figure: None,
            config: PlotConfig::default(),
            builds: 0,
            resize,
            needs_redraw: false,
        }
    }

    /// Show `chart`; returns true when the figure was rebuilt
    pub fn set_chart(&mut self, chart: &Arc<Chart>) -> bool {
        if self.chart.as_ref().is_some_and(|current| Arc::ptr_eq(current, chart)) {
            return false;
        }

        self.figure = Some(build_figure(chart));
        self.chart = Some(Arc::clone(chart));
        self.builds += 1;
        self.needs_redraw = true;
        tracing::debug!(chart_type = chart.chart_type(), "Rebuilt chart figure");
        true
    }

    pub fn chart(&self) -> Option<&Arc<Chart>> {
        self.chart.as_ref()
    }

    pub fn figure(&self) -> Option<&Figure> {
        self.figure.as_ref()
    }

    /// How many times a figure has been built
    pub fn build_count(&self) -> usize {
        self.builds
    }

    /// True once after a rebuild or a terminal resize
    pub fn take_redraw(&mut self) -> bool {
        let resized = self.resize.take_change().is_some();
        std::mem::take(&mut self.needs_redraw) || resized
    }

    /// Hand the current figure to another sink
    pub fn plot_to(&self, sink: &mut dyn PlotSink) -> anyhow::Result<bool> {
        match &self.figure {
            Some(figure) => {
                sink.plot(figure, &self.config)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Widget for &ChartView {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if let Some(figure) = &self.figure {
            TerminalPlot::new(figure).render(area, buf);
        }
    }
}

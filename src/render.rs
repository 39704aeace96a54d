//! SNR chart rendering
use log::{debug, warn};

use std::path::{Path, PathBuf};

use maud::{DOCTYPE, PreEscaped, html};

use plotly::{
    Layout, Plot, Scatter,
    common::{HoverInfo, Mode, Title},
    layout::{Axis, AxisType, GridPattern, LayoutGrid},
};

use hifitime::prelude::Epoch;

use crate::{
    error::Error,
    extract::{ChannelSeries, MAX_BANDS},
};

/// Y axis label, common to all rows
pub const SNR_LABEL: &str = "SNR (dB-Hz)";

/// Shared X axis label
pub const TIME_LABEL: &str = "Time (UTC)";

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

/// Chart div identifier
const CHART_ID: &str = "snr-chart";

/// Row height (pixels)
const ROW_HEIGHT: usize = 320;

/// Wall clock representation of this [Epoch], in its own time scale,
/// as expected by plotly date axes.
fn wall_clock(t: &Epoch) -> String {
    let formatted = t.to_string();
    match formatted.split_once(' ') {
        Some((wall_clock, _)) => wall_clock.to_string(),
        None => formatted,
    }
}

/// Trace reference of the y axis of this grid row
fn y_axis_id(row: usize) -> String {
    match row {
        0 => "y".to_string(),
        row => format!("y{}", row + 1),
    }
}

/// Attaches the y axis of this grid row
fn with_y_axis(layout: Layout, row: usize, axis: Axis) -> Layout {
    match row {
        0 => layout.y_axis(axis),
        1 => layout.y_axis2(axis),
        2 => layout.y_axis3(axis),
        3 => layout.y_axis4(axis),
        4 => layout.y_axis5(axis),
        5 => layout.y_axis6(axis),
        6 => layout.y_axis7(axis),
        _ => layout.y_axis8(axis),
    }
}

/// Renders stacked SNR rows into a standalone HTML page
#[derive(Debug, Clone)]
pub struct Renderer {
    /// Output HTML file
    pub html: PathBuf,

    /// Header image, displayed on top of the page
    pub header: Option<PathBuf>,
}

impl Renderer {
    pub fn new(html: &Path) -> Self {
        Self {
            html: html.to_path_buf(),
            header: None,
        }
    }

    /// Builds a single chart: one grid row per band, each with its own
    /// y axis, all sharing the time axis. Only the bottom row
    /// contributes to the satellite legend.
    fn chart(title: &str, channels: &[ChannelSeries]) -> Plot {
        if channels.len() > MAX_BANDS {
            warn!("only the first {} bands are charted", MAX_BANDS);
        }

        let channels = &channels[..channels.len().min(MAX_BANDS)];
        let rows = channels.len().max(1);
        let bottom = rows - 1;

        let mut layout = Layout::new()
            .title(Title::with_text(title))
            .grid(
                LayoutGrid::new()
                    .rows(rows)
                    .columns(1)
                    .pattern(GridPattern::Coupled),
            )
            .x_axis(
                Axis::new()
                    .title(Title::with_text(TIME_LABEL))
                    .type_(AxisType::Date)
                    .show_tick_labels(true),
            )
            .show_legend(true)
            .height(ROW_HEIGHT * rows)
            .auto_size(true);

        for (row, series) in channels.iter().enumerate() {
            let axis_title = format!("{}<br>{}", series.title(), SNR_LABEL);
            layout = with_y_axis(
                layout,
                row,
                Axis::new().title(Title::with_text(&axis_title)).zero_line(false),
            );
        }

        let mut plot = Plot::new();
        plot.set_layout(layout);

        for (row, series) in channels.iter().enumerate() {
            debug!(
                "{}: {} epochs, {} satellites",
                series.label,
                series.rows(),
                series.columns()
            );

            for sv in series.satellites.iter() {
                let column = series.column(sv);

                let x = column.iter().map(|(t, _)| wall_clock(t)).collect::<Vec<_>>();
                let y = column.iter().map(|(_, snr)| *snr).collect::<Vec<_>>();

                let trace = Scatter::new(x, y)
                    .mode(Mode::Lines)
                    .name(&sv.to_string())
                    .legend_group(&sv.to_string())
                    .show_legend(row == bottom)
                    .y_axis(&y_axis_id(row))
                    .hover_info(HoverInfo::All);

                plot.add_trace(trace);
            }
        }

        plot
    }

    /// Renders these [ChannelSeries] as vertically stacked rows,
    /// in the given order, sharing the same time axis.
    pub fn to_html(&self, title: &str, channels: &[ChannelSeries]) -> String {
        let chart = Self::chart(title, channels).to_inline_html(Some(CHART_ID));

        let header = self
            .header
            .as_ref()
            .map(|path| path.to_string_lossy().to_string());

        let markup = html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (title) }
                    script src=(PLOTLY_JS) {}
                }
                body {
                    @if let Some(header) = header {
                        img src=(header) width="800" height="100" alt="header";
                    }
                    h2 { (title) }
                    div class="chart" {
                        (PreEscaped(chart))
                    }
                }
            }
        };

        markup.into_string()
    }

    /// Renders and writes the HTML page, returns its location
    pub fn render(&self, title: &str, channels: &[ChannelSeries]) -> Result<PathBuf, Error> {
        let html = self.to_html(title, channels);

        if let Some(parent) = self.html.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::Render(e.to_string()))?;
            }
        }

        std::fs::write(&self.html, html).map_err(|e| Error::Render(e.to_string()))?;

        debug!("chart rendered in {}", self.html.display());
        Ok(self.html.clone())
    }
}

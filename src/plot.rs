//! Line charts of a metric against epsilon.

use errors::*;
use metrics::EnrichedRow;
use plotters::prelude::*;
use std::fmt::Display;
use std::path::Path;

const FONT: &str = "sans-serif";

/// Appearance of the summary plots.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotSpec {
    /// Prefix of every image file name.
    pub name: String,
    /// Whether to render at all.
    pub render: bool,
    /// Font size of labels and legend.
    pub font_size: u32,
    /// Image size in pixels.
    pub size: (u32, u32),
    /// Label of the epsilon axis.
    pub x_desc: String,
    /// Legend of the F1 chart.
    pub f1_legend: String,
    /// Y label of the F1 chart.
    pub f1_y_desc: String,
    /// Legend of the time-per-event chart.
    pub time_legend: String,
    /// Y label of the time-per-event chart.
    pub time_y_desc: String,
}

impl PlotSpec {
    /// Creates a spec with the default labels.
    pub fn new<S: Into<String>>(name: S) -> Self {
        PlotSpec {
            name: name.into(),
            render: true,
            font_size: 20,
            size: (1024, 768),
            x_desc: "ε".to_string(),
            f1_legend: "F1-score".to_string(),
            f1_y_desc: "F1-score".to_string(),
            time_legend: "Time per event".to_string(),
            time_y_desc: "Time (ms)".to_string(),
        }
    }

    /// File name of the F1 chart.
    pub fn f1_file(&self) -> String {
        format!("{}_F1_score.png", self.name)
    }

    /// File name of the time-per-event chart.
    pub fn time_file(&self) -> String {
        format!("{}_iter_time.png", self.name)
    }
}

/// A labelled list of (epsilon, value) points.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    /// Legend entry.
    pub label: String,
    /// Points in increasing epsilon order.
    pub points: Vec<(f64, f64)>,
}

impl Series {
    /// Collects one metric over `rows`, skipping the rows where it is
    /// undefined. The remaining points stay one series.
    pub fn from_rows<F>(label: &str, rows: &[EnrichedRow], metric: F) -> Series
    where
        F: Fn(&EnrichedRow) -> Option<f64>,
    {
        let points = rows.iter()
            .filter_map(|r| metric(r).map(|y| (r.row.epsilon, y)))
            .filter(|&(_, y)| y.is_finite())
            .collect();
        Series {
            label: label.to_string(),
            points: points,
        }
    }

    /// The points a logarithmic axis can show, i.e., positive ones.
    pub fn positive(&self) -> Series {
        Series {
            label: self.label.clone(),
            points: self.points.iter().cloned().filter(|&(_, y)| y > 0.0).collect(),
        }
    }

    fn y_bounds(&self) -> Option<(f64, f64)> {
        self.points.iter().fold(None, |acc, &(_, y)| match acc {
            None => Some((y, y)),
            Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        })
    }
}

fn font(spec: &PlotSpec) -> (&'static str, i32) {
    (FONT, spec.font_size as i32)
}

fn plot_error<E: Display>(e: E) -> Error {
    ErrorKind::Plot(e.to_string()).into()
}

/// Draws `series` with a linear y-axis starting at zero.
pub fn linear_chart(path: &Path, series: &Series, x_max: f64, y_desc: &str, spec: &PlotSpec) -> Result<()> {
    let y_max = match series.y_bounds() {
        Some((_, hi)) if hi > 1.0 => hi * 1.05,
        _ => 1.05,
    };

    let root = BitMapBackend::new(path, spec.size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(spec.font_size as i32 * 3)
        .y_label_area_size(spec.font_size as i32 * 4)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc(spec.x_desc.as_str())
        .y_desc(y_desc)
        .label_style(font(spec))
        .axis_desc_style(font(spec))
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(series.points.iter().cloned(), &BLUE))
        .map_err(plot_error)?
        .label(series.label.as_str())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    chart
        .configure_series_labels()
        .label_font(font(spec))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// Draws `series` with a logarithmic y-axis. Non-positive points are
/// skipped.
pub fn log_chart(path: &Path, series: &Series, x_max: f64, y_desc: &str, spec: &PlotSpec) -> Result<()> {
    let series = series.positive();
    let (y_min, y_max) = match series.y_bounds() {
        Some((lo, hi)) if lo < hi => (lo / 2.0, hi * 2.0),
        Some((lo, _)) => (lo / 10.0, lo * 10.0),
        None => (1e-3, 1.0),
    };

    let root = BitMapBackend::new(path, spec.size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(spec.font_size as i32 * 3)
        .y_label_area_size(spec.font_size as i32 * 5)
        .build_cartesian_2d(0.0..x_max, (y_min..y_max).log_scale())
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc(spec.x_desc.as_str())
        .y_desc(y_desc)
        .label_style(font(spec))
        .axis_desc_style(font(spec))
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(series.points.iter().cloned(), &RED))
        .map_err(plot_error)?
        .label(series.label.as_str())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

    chart
        .configure_series_labels()
        .label_font(font(spec))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

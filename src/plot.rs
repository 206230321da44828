//! Predicted-vs-actual scatter plot.
//!
//! Renders the final-cycle crack length of every fleet unit as an SVG
//! scatter, one series per model, over a dashed `y = x` reference line on
//! square axes. The legend sits in the lower right corner and carries each
//! model's error metrics formatted like C's `%1.1e`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::PlotConfig;
use crate::physics::ErrorMetrics;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 90.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 70.0;
const MARKER_RADIUS: f64 = 3.5;

/// Series colors, in the order series are added.
const PALETTE: [&str; 4] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728"];

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Invalid axis bounds: lower={lower}, upper={upper}")]
    InvalidBounds { lower: f64, upper: f64 },

    #[error("Series '{label}' has {actual} actual values but {predicted} predicted values")]
    LengthMismatch {
        label: String,
        actual: usize,
        predicted: usize,
    },

    #[error("Nothing to plot")]
    Empty,

    #[error("Failed to write plot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One model's points.
#[derive(Debug, Clone)]
pub struct ScatterSeries {
    /// Legend text; `\n` starts a new line.
    pub label: String,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
}

impl ScatterSeries {
    /// Series labelled with the model name and its error metrics.
    pub fn with_metrics(name: &str, actual: &[f64], predicted: &[f64], metrics: &ErrorMetrics) -> Self {
        Self {
            label: legend_label(name, metrics),
            actual: actual.to_vec(),
            predicted: predicted.to_vec(),
        }
    }
}

/// Square predicted-vs-actual scatter plot.
#[derive(Debug, Clone)]
pub struct PredictionPlot {
    lower: f64,
    upper: f64,
    font_size: u32,
    x_label: String,
    y_label: String,
    series: Vec<ScatterSeries>,
}

impl PredictionPlot {
    pub fn new(config: &PlotConfig) -> Result<Self, PlotError> {
        let (lower, upper) = (config.lower_bound, config.upper_bound);
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(PlotError::InvalidBounds { lower, upper });
        }
        Ok(Self {
            lower,
            upper,
            font_size: config.font_size,
            x_label: "actual crack length (m)".to_string(),
            y_label: "predicted crack length (m)".to_string(),
            series: Vec::new(),
        })
    }

    pub fn add_series(&mut self, series: ScatterSeries) -> Result<(), PlotError> {
        if series.actual.len() != series.predicted.len() {
            return Err(PlotError::LengthMismatch {
                label: series.label,
                actual: series.actual.len(),
                predicted: series.predicted.len(),
            });
        }
        self.series.push(series);
        Ok(())
    }

    pub fn series(&self) -> &[ScatterSeries] {
        &self.series
    }

    fn plot_width() -> f64 {
        WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height() -> f64 {
        HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn px(&self, value: f64) -> f64 {
        MARGIN_LEFT + (value - self.lower) / (self.upper - self.lower) * Self::plot_width()
    }

    fn py(&self, value: f64) -> f64 {
        MARGIN_TOP + Self::plot_height() - (value - self.lower) / (self.upper - self.lower) * Self::plot_height()
    }

    /// Render the plot as a standalone SVG document.
    pub fn render_svg(&self) -> Result<String, PlotError> {
        if self.series.is_empty() {
            return Err(PlotError::Empty);
        }

        let fs = f64::from(self.font_size);
        let (x0, x1) = (MARGIN_LEFT, MARGIN_LEFT + Self::plot_width());
        let (y0, y1) = (MARGIN_TOP, MARGIN_TOP + Self::plot_height());

        let mut svg = String::new();
        // Writing into a String cannot fail
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="{fs}">"#
        );
        let _ = write!(svg, r#"<rect width="{WIDTH}" height="{HEIGHT}" fill="white"/>"#);
        let _ = write!(
            svg,
            r#"<defs><clipPath id="axes"><rect x="{x0}" y="{y0}" width="{}" height="{}"/></clipPath></defs>"#,
            Self::plot_width(),
            Self::plot_height()
        );

        // Grid and ticks
        let ticks = tick_values(self.lower, self.upper);
        let decimals = tick_decimals(self.lower, self.upper);
        for &t in &ticks {
            let x = self.px(t);
            let y = self.py(t);
            let _ = write!(
                svg,
                "<line x1=\"{x:.2}\" y1=\"{y0}\" x2=\"{x:.2}\" y2=\"{y1}\" stroke=\"#b0b0b0\" stroke-width=\"0.8\"/>"
            );
            let _ = write!(
                svg,
                "<line x1=\"{x0}\" y1=\"{y:.2}\" x2=\"{x1}\" y2=\"{y:.2}\" stroke=\"#b0b0b0\" stroke-width=\"0.8\"/>"
            );
            let _ = write!(
                svg,
                r#"<text x="{x:.2}" y="{:.2}" text-anchor="middle">{t:.decimals$}</text>"#,
                y1 + fs + 6.0
            );
            let _ = write!(
                svg,
                r#"<text x="{:.2}" y="{:.2}" text-anchor="end">{t:.decimals$}</text>"#,
                x0 - 6.0,
                y + fs * 0.35
            );
        }

        // Axes frame
        let _ = write!(
            svg,
            r#"<rect x="{x0}" y="{y0}" width="{}" height="{}" fill="none" stroke="black" stroke-width="1"/>"#,
            Self::plot_width(),
            Self::plot_height()
        );

        // Axis labels
        let _ = write!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" text-anchor="middle">{}</text>"#,
            (x0 + x1) / 2.0,
            HEIGHT - 15.0,
            escape_xml(&self.x_label)
        );
        let ylx = 22.0;
        let yly = (y0 + y1) / 2.0;
        let _ = write!(
            svg,
            r#"<text x="{ylx}" y="{yly:.2}" text-anchor="middle" transform="rotate(-90 {ylx} {yly:.2})">{}</text>"#,
            escape_xml(&self.y_label)
        );

        // Reference diagonal
        let _ = write!(
            svg,
            r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="black" stroke-width="1.5" stroke-dasharray="6,4" clip-path="url(#axes)"/>"#,
            self.px(self.lower),
            self.py(self.lower),
            self.px(self.upper),
            self.py(self.upper)
        );

        // Points
        for (i, series) in self.series.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let _ = write!(svg, r#"<g fill="{color}" clip-path="url(#axes)">"#);
            for (&a, &p) in series.actual.iter().zip(&series.predicted) {
                if !a.is_finite() || !p.is_finite() {
                    continue;
                }
                let _ = write!(
                    svg,
                    r#"<circle cx="{:.2}" cy="{:.2}" r="{MARKER_RADIUS}"/>"#,
                    self.px(a),
                    self.py(p)
                );
            }
            svg.push_str("</g>");
        }

        self.render_legend(&mut svg, fs, x1, y1);

        svg.push_str("</svg>");
        Ok(svg)
    }

    /// Legend box anchored to the lower right corner of the axes.
    fn render_legend(&self, svg: &mut String, fs: f64, right: f64, bottom: f64) {
        let line_height = fs * 1.2;
        let pad = fs * 0.5;
        let marker_col = fs * 1.6;

        let entries: Vec<Vec<&str>> = self.series.iter().map(|s| s.label.split('\n').collect()).collect();
        let longest = entries.iter().flatten().map(|l| l.chars().count()).max().unwrap_or(0);
        let lines: usize = entries.iter().map(Vec::len).sum();

        let width = pad * 2.0 + marker_col + longest as f64 * fs * 0.6;
        let height = pad * 2.0 + lines as f64 * line_height + (entries.len().saturating_sub(1)) as f64 * pad;
        let left = right - width - 8.0;
        let top = bottom - height - 8.0;

        let _ = write!(
            svg,
            "<rect x=\"{left:.2}\" y=\"{top:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" rx=\"3\" fill=\"white\" fill-opacity=\"0.8\" stroke=\"#cccccc\"/>"
        );

        let mut y = top + pad;
        for (i, lines) in entries.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let _ = write!(
                svg,
                r#"<circle cx="{:.2}" cy="{:.2}" r="{MARKER_RADIUS}" fill="{color}"/>"#,
                left + pad + marker_col / 2.0,
                y + line_height * lines.len() as f64 / 2.0
            );
            let text_x = left + pad + marker_col;
            let _ = write!(svg, r#"<text x="{text_x:.2}" y="{:.2}">"#, y + fs);
            for (j, line) in lines.iter().enumerate() {
                let dy = if j == 0 { 0.0 } else { line_height };
                let _ = write!(
                    svg,
                    r#"<tspan x="{text_x:.2}" dy="{dy:.2}">{}</tspan>"#,
                    escape_xml(line)
                );
            }
            svg.push_str("</text>");
            y += line_height * lines.len() as f64 + pad;
        }
    }

    /// Render and write the SVG atomically.
    pub fn save(&self, path: &Path) -> Result<(), PlotError> {
        let svg = self.render_svg()?;
        crate::persist::write_atomic(path, svg.as_bytes()).map_err(|source| PlotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), series = self.series.len(), "Prediction plot written");
        Ok(())
    }
}

/// `"<name>\nMSE = <mse>\nMAE = <max abs error>"`.
pub fn legend_label(name: &str, metrics: &ErrorMetrics) -> String {
    format!(
        "{name}\nMSE = {}\nMAE = {}",
        format_sci(metrics.mse),
        format_sci(metrics.max_abs_error)
    )
}

/// Format like C's `%1.1e`: one decimal, signed exponent of at least two
/// digits (`1.2e-05`).
pub fn format_sci(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let rust = format!("{value:.1e}");
    match rust.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => rust,
    }
}

/// Round tick positions covering `[lower, upper]`, about six intervals.
fn tick_values(lower: f64, upper: f64) -> Vec<f64> {
    let step = tick_step(lower, upper);
    let first = (lower / step - 1e-9).ceil() as i64;
    let last = (upper / step + 1e-9).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

fn tick_step(lower: f64, upper: f64) -> f64 {
    let raw = (upper - lower) / 6.0;
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized <= 1.0 + 1e-9 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn tick_decimals(lower: f64, upper: f64) -> usize {
    let step = tick_step(lower, upper);
    let d = (-step.log10() - 1e-9).ceil();
    if d > 0.0 {
        d as usize
    } else {
        0
    }
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

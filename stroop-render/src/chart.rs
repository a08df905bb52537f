//! Box-and-whisker chart of reaction times per block, rendered to PNG.

use anyhow::{Context, Result, anyhow, bail};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use stroop_core::{BlockKind, TrialResult};
use stroop_experiment::analysis::{box_stats, correct_reaction_times};
use tiny_skia::Pixmap;
use tracing::info;

const FONT_FAMILY: &str = "sans-serif";
const LABEL_PX: f64 = 16.0;
const TITLE_PX: f64 = 22.0;

const BOX: RGBColor = RGBColor(31, 119, 180);
const OUTLIER: RGBColor = RGBColor(214, 39, 40);

/// One labelled distribution, values in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlot {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub series: Vec<ChartSeries>,
}

/// A font registered with the chart backend; charts without one carry no text.
#[derive(Debug, Clone, Copy)]
pub struct ChartFont {
    family: &'static str,
}

/// Registers `bytes` as the chart font. Only the first registration takes effect.
pub fn register_chart_font(bytes: Vec<u8>) -> Result<ChartFont> {
    static REGISTERED: OnceLock<ChartFont> = OnceLock::new();
    if let Some(font) = REGISTERED.get() {
        return Ok(*font);
    }
    // The backend keeps fonts for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font(FONT_FAMILY, FontStyle::Normal, bytes)
        .map_err(|_| anyhow!("chart backend rejected the font"))?;
    Ok(*REGISTERED.get_or_init(|| ChartFont {
        family: FONT_FAMILY,
    }))
}

impl BoxPlot {
    /// Correct-trial reaction times of the four blocks, in block order.
    pub fn from_trials(title: impl Into<String>, trials: &[TrialResult]) -> Self {
        Self {
            title: title.into(),
            width: 900,
            height: 600,
            series: BlockKind::ALL
                .iter()
                .map(|kind| ChartSeries {
                    label: kind.label().to_string(),
                    values: correct_reaction_times(trials, *kind)
                        .into_iter()
                        .map(|s| s * 1_000.0)
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Value range covering the data and the drawn whiskers, padded; `(0, 1)` when empty.
fn value_range(series: &[(&ChartSeries, Option<Quartiles>)]) -> (f32, f32) {
    let (lo, hi) = series
        .iter()
        .flat_map(|(s, q)| {
            s.values
                .iter()
                .map(|v| *v as f32)
                .chain(q.iter().flat_map(|q| q.values()))
        })
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.08).max(1.0);
    ((lo - pad).max(0.0), hi + pad)
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    plot: &BoxPlot,
    font: Option<ChartFont>,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    let labels: Vec<&str> = plot.series.iter().map(|s| s.label.as_str()).collect();
    let series: Vec<_> = plot
        .series
        .iter()
        .map(|s| (s, (!s.values.is_empty()).then(|| Quartiles::new(&s.values))))
        .collect();
    let (lo, hi) = value_range(&series);

    let mut builder = ChartBuilder::on(root);
    builder.margin(20);
    if let Some(font) = font {
        builder
            .caption(&plot.title, (font.family, TITLE_PX))
            .x_label_area_size(50)
            .y_label_area_size(70);
    }
    let mut chart = builder.build_cartesian_2d(labels[..].into_segmented(), lo..hi)?;

    if let Some(font) = font {
        let block_label = |value: &SegmentValue<&&str>| match value {
            SegmentValue::Exact(label) | SegmentValue::CenterOf(label) => label.to_string(),
            SegmentValue::Last => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_label_formatter(&block_label)
            .y_desc("RT (ms)")
            .label_style((font.family, LABEL_PX))
            .axis_desc_style((font.family, LABEL_PX))
            .draw()?;
    }

    for (label, (s, quartiles)) in labels.iter().zip(&series) {
        let key = SegmentValue::CenterOf(label);
        match (quartiles, box_stats(&s.values)) {
            (Some(quartiles), Some(stats)) => {
                chart.draw_series(std::iter::once(
                    Boxplot::new_vertical(key.clone(), quartiles)
                        .width(60)
                        .whisker_width(0.5)
                        .style(BOX.stroke_width(2)),
                ))?;
                chart.draw_series(
                    stats
                        .outliers
                        .iter()
                        .map(|v| Circle::new((key.clone(), *v as f32), 3, OUTLIER.filled())),
                )?;
            }
            _ => {
                if let Some(font) = font {
                    chart.plotting_area().draw(&Text::new(
                        "no data",
                        (key.clone(), (lo + hi) * 0.5),
                        (font.family, LABEL_PX),
                    ))?;
                }
            }
        }
    }
    Ok(())
}

/// Renders the chart. Labels need a registered [`ChartFont`]; without one only the
/// boxes and outliers are drawn.
pub fn render_box_plot(plot: &BoxPlot, font: Option<ChartFont>) -> Result<Pixmap> {
    let (width, height) = (plot.width, plot.height);
    if width == 0 || height == 0 {
        bail!("invalid chart size {width}x{height}");
    }
    let mut rgb = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut rgb, (width, height)).into_drawing_area();
        draw(&root, plot, font).map_err(|e| anyhow!("drawing chart: {e}"))?;
        root.present().map_err(|e| anyhow!("finishing chart: {e}"))?;
    }

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| anyhow!("invalid chart size {width}x{height}"))?;
    for (dst, src) in pixmap.data_mut().chunks_exact_mut(4).zip(rgb.chunks_exact(3)) {
        dst[..3].copy_from_slice(src);
        dst[3] = 255;
    }
    Ok(pixmap)
}

/// Encodes `pixmap` as PNG, written beside `path` and renamed into place.
pub fn save_png(path: &Path, pixmap: &Pixmap) -> Result<()> {
    let bytes = pixmap.encode_png().context("encoding chart PNG")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    fs::write(&tmp, bytes).with_context(|| format!("writing {}", path.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("moving chart into {}", path.display()))?;
    info!(path = %path.display(), "chart written");
    Ok(())
}

// Plotters render sink: dual-axis charts and grids to PNG

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

use crate::compiler::compile_layout;
use crate::config::RenderConfig;
use crate::dataset::Dataset;
use crate::ir::ChartSpec;
use crate::palette::{color_for, Rgb};
use crate::scale::{auto_range, AxisRange};
use crate::selection::AxisSide;
use crate::tooltip::DATE_FORMAT;

const SECONDS_PER_DAY: f64 = 86_400.0;
const TOOLTIP_LINE_HEIGHT: i32 = 14;

/// Render one chart to PNG bytes. `active` is the crosshair row, if any.
pub fn render_chart(
    spec: &ChartSpec,
    dataset: &Dataset,
    config: &RenderConfig,
    active: Option<usize>,
) -> Result<Vec<u8>> {
    render_grid(std::slice::from_ref(spec), dataset, config, active)
}

/// Render a collection of charts on one canvas, `config.columns` per row.
/// All charts share one crosshair row, as members of one group do.
pub fn render_grid(
    charts: &[ChartSpec],
    dataset: &Dataset,
    config: &RenderConfig,
    active: Option<usize>,
) -> Result<Vec<u8>> {
    if charts.is_empty() {
        anyhow::bail!("Cannot render an empty chart collection");
    }

    let layout = compile_layout(charts.len(), config.columns);
    let (width, height) = config
        .canvas_size(charts.len())
        .context("Canvas size overflows")?;
    let buffer_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .context("Canvas size overflows")?;
    let mut buffer = vec![0u8; buffer_len];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();

        root.fill(&WHITE).context("Failed to fill background")?;

        let areas = root.split_evenly((layout.nrow, layout.ncol));
        for cell in &layout.cells {
            let spec = &charts[cell.chart];
            let area = &areas[cell.row * layout.ncol + cell.col];
            draw_chart(area, spec, dataset, config, active)
                .with_context(|| format!("Failed to draw chart '{}'", spec.title))?;
        }

        root.present().context("Failed to present drawing")?;
    }

    debug!(charts = charts.len(), width, height, "rendered chart grid");
    encode_png(&buffer, width, height)
}

fn draw_chart(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    spec: &ChartSpec,
    dataset: &Dataset,
    config: &RenderConfig,
    active: Option<usize>,
) -> Result<()> {
    let xs: Vec<f64> = dataset.dates().iter().map(|d| to_x(*d)).collect();
    let x_range = date_domain(&xs);

    // Primary auto-scales to its own series; secondary keeps the stored range
    let y_primary = auto_range(dataset, spec.primary.names())?;
    let y_secondary = spec.secondary_range;

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(&spec.title, ("sans-serif", 16))
        .x_label_area_size(30)
        .y_label_area_size(50)
        .right_y_label_area_size(50)
        .build_cartesian_2d(x_range.min..x_range.max, y_primary.min..y_primary.max)
        .context("Failed to build chart")?
        .set_secondary_coord(x_range.min..x_range.max, y_secondary.min..y_secondary.max);

    chart
        .configure_mesh()
        .x_labels(5)
        .x_label_formatter(&|x| format_x(*x))
        .draw()
        .context("Failed to draw mesh")?;

    chart
        .configure_secondary_axes()
        .y_desc("secondary")
        .draw()
        .context("Failed to draw secondary axis")?;

    for style in &spec.series {
        let values = dataset.column(&style.name)?;
        let points: Vec<(f64, f64)> = xs
            .iter()
            .copied()
            .zip(values.iter().copied())
            .filter(|(_, y)| y.is_finite())
            .collect();
        let line = to_plotters(style.color).stroke_width(config.line_width);

        let anno = match style.axis {
            AxisSide::Primary => chart.draw_series(LineSeries::new(points, line)),
            AxisSide::Secondary => chart.draw_secondary_series(LineSeries::new(points, line)),
        }
        .context("Failed to draw line series")?;
        anno.label(style.name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line));
    }

    if let Some(index) = active.filter(|&i| i < xs.len()) {
        let x = xs[index];

        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x, y_primary.min), (x, y_primary.max)],
                BLACK.mix(0.6).stroke_width(1),
            )))
            .context("Failed to draw crosshair")?;

        // Only the anchor series carries the hover marker
        if let Some(v) = dataset
            .value(&spec.hover_anchor, index)
            .filter(|v| v.is_finite())
        {
            let color = to_plotters(color_for(&spec.hover_anchor));
            chart
                .draw_series(std::iter::once(Circle::new((x, v), 4, color.filled())))
                .context("Failed to draw hover marker")?;
        }

        let lines = spec.tooltip.format_at(dataset, index);
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as i32;
        let box_w = 10 + 7 * longest;
        let box_h = 6 + TOOLTIP_LINE_HEIGHT * lines.len() as i32;
        // Flip the box to the left of the crosshair on the right half
        let dx = if x > (x_range.min + x_range.max) / 2.0 {
            -(box_w + 8)
        } else {
            8
        };
        let anchor = (x, y_primary.max);

        chart
            .draw_series(std::iter::once(
                EmptyElement::at(anchor)
                    + Rectangle::new([(dx, 4), (dx + box_w, 4 + box_h)], WHITE.mix(0.9).filled()),
            ))
            .context("Failed to draw tooltip background")?;
        chart
            .draw_series(lines.iter().enumerate().map(|(i, line)| {
                EmptyElement::at(anchor)
                    + Text::new(
                        line.clone(),
                        (dx + 5, 8 + TOOLTIP_LINE_HEIGHT * i as i32),
                        ("sans-serif", 12).into_font(),
                    )
            }))
            .context("Failed to draw tooltip")?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .context("Failed to draw legend")?;

    Ok(())
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }
    Ok(png_bytes)
}

fn to_plotters(color: Rgb) -> RGBColor {
    RGBColor(color.r, color.g, color.b)
}

/// Dates are plotted as seconds since the Unix epoch.
fn to_x(date: NaiveDateTime) -> f64 {
    date.and_utc().timestamp() as f64
}

fn format_x(x: f64) -> String {
    DateTime::from_timestamp(x.round() as i64, 0)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn date_domain(xs: &[f64]) -> AxisRange {
    let min = xs.first().copied().unwrap_or(0.0);
    let max = xs.last().copied().unwrap_or(0.0);
    if min == max {
        AxisRange {
            min: min - SECONDS_PER_DAY,
            max: max + SECONDS_PER_DAY,
        }
    } else {
        AxisRange { min, max }
    }
}

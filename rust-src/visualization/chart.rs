//! Line chart export for daily download series.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate};
use thiserror::Error;
use tracing::debug;

use crate::models::Series;


// Light theme colors
const BG: &str = "#FFFFFF";
const TEXT: &str = "#222222";
const TEXT_SECONDARY: &str = "#555555";
const AXIS: &str = "#333333";
const GRID: &str = "#D3D3D3";
const LINE: &str = "#1F77B4";

// Plot area margins
const MARGIN_LEFT: f64 = 110.0;
const MARGIN_RIGHT: f64 = 50.0;
const MARGIN_TOP: f64 = 70.0;
const MARGIN_BOTTOM: f64 = 80.0;

const Y_TICK_TARGET: u64 = 6;
const WEEKLY_TICKS_MAX_DAYS: i64 = 62;


/// Failures specific to chart rendering.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("No data to plot: the download series is empty")]
    EmptySeries,
}


/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormat {
    Png,
    Svg,
}


impl ChartFormat {
    /// Pick the format from a file extension, defaulting to PNG.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("svg") => ChartFormat::Svg,
            _ => ChartFormat::Png,
        }
    }
}


/// Chart appearance settings.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
}


impl Default for ChartOptions {
    fn default() -> Self {
        // 12x5 inches at 150 dpi
        Self {
            title: "PyPI downloads".to_string(),
            width: 1800,
            height: 750,
        }
    }
}


/// Render `series` as a line chart at `output_path`.
///
/// The format follows the file extension: `.svg` is written as-is, anything
/// else is rasterised to PNG.
pub fn render_chart(series: &Series, output_path: &Path, options: &ChartOptions) -> Result<()> {
    if series.is_empty() {
        return Err(ChartError::EmptySeries.into());
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let svg_content = generate_svg(series, options);

    match ChartFormat::from_path(output_path) {
        ChartFormat::Svg => {
            std::fs::write(output_path, svg_content)
                .with_context(|| format!("Failed to write SVG to {}", output_path.display()))?;
        }
        ChartFormat::Png => write_png(&svg_content, output_path)?,
    }

    debug!(path = %output_path.display(), points = series.len(), "chart written");

    Ok(())
}


/// Rasterise SVG content to a PNG file.
fn write_png(svg_content: &str, output_path: &Path) -> Result<()> {
    let mut usvg_options = resvg::usvg::Options::default();
    usvg_options.fontdb_mut().load_system_fonts();

    let tree = resvg::usvg::Tree::from_str(svg_content, &usvg_options)
        .context("Failed to parse SVG")?;

    let size = tree.size();
    let width = size.width().ceil() as u32;
    let height = size.height().ceil() as u32;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .context("Failed to create pixmap")?;

    let bg = hex_to_rgb(BG);
    pixmap.fill(tiny_skia::Color::from_rgba8(bg.0, bg.1, bg.2, 255));

    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    pixmap.save_png(output_path)
        .with_context(|| format!("Failed to save PNG to {}", output_path.display()))?;

    Ok(())
}


/// Generate SVG content for the chart. `series` must not be empty.
pub fn generate_svg(series: &Series, options: &ChartOptions) -> String {
    let width = options.width as f64;
    let height = options.height as f64;
    let plot_left = MARGIN_LEFT;
    let plot_right = width - MARGIN_RIGHT;
    let plot_top = MARGIN_TOP;
    let plot_bottom = height - MARGIN_BOTTOM;
    let plot_width = plot_right - plot_left;
    let plot_height = plot_bottom - plot_top;

    let (Some(start), Some(end)) = (series.first_date(), series.last_date()) else {
        return String::new();
    };
    let span = (end - start).num_days().max(1) as f64;

    let (y_step, y_max) = y_axis_scale(series.max_downloads());

    let x_of = |date: NaiveDate| plot_left + ((date - start).num_days() as f64 / span) * plot_width;
    let y_of = |value: u64| plot_bottom - (value as f64 / y_max as f64) * plot_height;

    let mut svg_parts = vec![
        format!(
            r#"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"#,
            options.width, options.height, options.width, options.height
        ),
        "<style>".to_string(),
        format!("  .title {{ fill: {}; font: bold 24px sans-serif; }}", TEXT),
        format!("  .axis-label {{ fill: {}; font: 18px sans-serif; }}", TEXT),
        format!("  .tick-label {{ fill: {}; font: 14px sans-serif; }}", TEXT_SECONDARY),
        "</style>".to_string(),
        format!(r#"<rect width="{}" height="{}" fill="{}"/>"#, options.width, options.height, BG),
    ];

    // Title
    svg_parts.push(format!(
        r#"<text x="{:.1}" y="{:.1}" class="title" text-anchor="middle">{}</text>"#,
        width / 2.0,
        MARGIN_TOP / 2.0 + 8.0,
        escape_xml(&options.title)
    ));

    // Horizontal grid and y tick labels
    let mut next_tick = Some(0u64);
    while let Some(tick) = next_tick.filter(|t| *t <= y_max) {
        let y = y_of(tick);
        svg_parts.push(format!(
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="1"/>"#,
            plot_left, y, plot_right, y, GRID
        ));
        svg_parts.push(format!(
            r#"<text x="{:.1}" y="{:.1}" class="tick-label" text-anchor="end">{}</text>"#,
            plot_left - 10.0,
            y + 5.0,
            format_number(tick)
        ));
        next_tick = tick.checked_add(y_step);
    }

    // X ticks
    for date in x_ticks(start, end) {
        let x = x_of(date);
        svg_parts.push(format!(
            r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="1"/>"#,
            x, plot_bottom, x, plot_bottom + 6.0, AXIS
        ));
        svg_parts.push(format!(
            r#"<text x="{:.1}" y="{:.1}" class="tick-label" text-anchor="middle">{}</text>"#,
            x,
            plot_bottom + 24.0,
            x_tick_label(date, (end - start).num_days())
        ));
    }

    // Axes
    svg_parts.push(format!(
        r#"<path d="M {:.1} {:.1} L {:.1} {:.1} L {:.1} {:.1}" fill="none" stroke="{}" stroke-width="1.5"/>"#,
        plot_left, plot_top, plot_left, plot_bottom, plot_right, plot_bottom, AXIS
    ));

    // Axis labels
    svg_parts.push(format!(
        r#"<text x="{:.1}" y="{:.1}" class="axis-label" text-anchor="middle">Date</text>"#,
        plot_left + plot_width / 2.0,
        height - 20.0
    ));
    svg_parts.push(format!(
        r#"<text x="25" y="{:.1}" class="axis-label" text-anchor="middle" transform="rotate(-90 25 {:.1})">Downloads</text>"#,
        plot_top + plot_height / 2.0,
        plot_top + plot_height / 2.0
    ));

    // Data
    if series.len() == 1 {
        let point = series.points()[0];
        svg_parts.push(format!(
            r#"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{}"/>"#,
            plot_left + plot_width / 2.0,
            y_of(point.downloads),
            LINE
        ));
    } else {
        let points: Vec<String> = series
            .iter()
            .map(|p| format!("{:.1},{:.1}", x_of(p.date), y_of(p.downloads)))
            .collect();
        svg_parts.push(format!(
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2" stroke-linejoin="round"/>"#,
            points.join(" "),
            LINE
        ));
    }

    svg_parts.push("</svg>".to_string());

    svg_parts.join("\n")
}


/// Choose a tick step and axis maximum covering `max_value`.
///
/// Steps are 1, 2 or 5 times a power of ten. The axis maximum is at least 1
/// so an all-zero series still has a scale, and saturates at `u64::MAX`.
fn y_axis_scale(max_value: u64) -> (u64, u64) {
    let max_value = max_value.max(1);
    let raw_step = (max_value as f64 / Y_TICK_TARGET as f64).max(1.0);
    let magnitude = 10f64.powi(raw_step.log10().floor() as i32);

    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw_step)
        .unwrap_or(10.0 * magnitude)
        .max(1.0) as u64;

    let y_max = max_value.div_ceil(step).saturating_mul(step);
    (step, y_max)
}


/// Tick dates for the x axis: weekly for short ranges, month starts otherwise.
fn x_ticks(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let span = (end - start).num_days();
    let mut ticks = Vec::new();

    if span <= WEEKLY_TICKS_MAX_DAYS {
        let mut current = start;
        while current <= end {
            ticks.push(current);
            current += Duration::days(7);
        }
        return ticks;
    }

    let mut current = start.with_day(1).unwrap_or(start);
    if current < start {
        current = next_month(current);
    }
    while current <= end {
        ticks.push(current);
        current = next_month(current);
    }

    ticks
}


fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}


fn x_tick_label(date: NaiveDate, span_days: i64) -> String {
    if span_days <= WEEKLY_TICKS_MAX_DAYS {
        date.format("%b %d").to_string()
    } else if date.month() == 1 {
        date.format("%b %Y").to_string()
    } else {
        date.format("%b").to_string()
    }
}


fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}


/// Convert hex color to RGB tuple.
fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
    let hex = hex.trim_start_matches('#');
    let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
    let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
    let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
    (r, g, b)
}


/// Format number with suffix.
fn format_number(num: u64) -> String {
    if num >= 1_000_000_000 {
        format!("{:.1}B", num as f64 / 1_000_000_000.0)
    } else if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}K", num as f64 / 1_000.0)
    } else {
        format!("{}", num)
    }
}

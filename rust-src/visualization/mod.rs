//! Visualization layer for download charts.

mod chart;

#[allow(unused_imports)]
pub use chart::{generate_svg, render_chart, ChartError, ChartFormat, ChartOptions};

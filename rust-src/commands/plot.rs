//! Plot command: fetch, merge into history, and chart recent downloads.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use tracing::info;

use crate::aggregation::{fill_gaps, merge, span_days, window};
use crate::config::{default_history_path, normalize_package_name};
use crate::data::PypiStatsClient;
use crate::models::Series;
use crate::storage::{load_history, save_history};
use crate::visualization::{render_chart, ChartOptions};


/// Settings for a single plot run.
#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub package: String,
    pub out: PathBuf,
    pub history_csv: Option<PathBuf>,
    pub days: usize,
    pub offline: bool,
    pub title: Option<String>,
    pub api_url: String,
    pub timeout: u64,
}


/// Run the plot command for today's date.
pub fn run(options: &PlotOptions) -> Result<()> {
    run_at(options, Local::now().date_naive())
}


/// Run the plot command with the window ending no later than `today`.
pub fn run_at(options: &PlotOptions, today: NaiveDate) -> Result<()> {
    let package = normalize_package_name(&options.package)?;
    let history_path = options
        .history_csv
        .clone()
        .unwrap_or_else(|| default_history_path(&package));

    // Offline mode needs something to plot from
    if options.offline && !history_path.exists() {
        anyhow::bail!(
            "Cannot use --offline without existing history at {}. \
             Run without --offline first to fetch data.",
            history_path.display()
        );
    }

    let existing = load_history(&history_path)?;

    let fetched = if options.offline {
        println!("Offline mode: reading history from {}", history_path.display());
        Series::new()
    } else {
        println!("Fetching downloads for {}...", package);
        let client = PypiStatsClient::new(&options.api_url, options.timeout)?;
        client.fetch_overall(&package)?
    };

    info!(existing = existing.len(), fetched = fetched.len(), "merging history");
    let history = fill_gaps(&merge(&existing, &fetched));

    if !options.offline && !history.is_empty() {
        save_history(&history_path, &history)?;
        println!(
            "Saved {} days of history to {}",
            span_days(&history),
            history_path.display()
        );
    }

    let recent = window(&history, options.days, today);

    let title = options.title.clone().unwrap_or_else(|| {
        format!(
            "PyPI downloads (pypistats), last {} days: {}",
            recent.len(),
            options.package.trim()
        )
    });
    let chart_options = ChartOptions {
        title,
        ..Default::default()
    };

    render_chart(&recent, &options.out, &chart_options)?;

    println!(
        "\x1b[32m+ Exported {} days ({} downloads) to: {}\x1b[0m",
        recent.len(),
        recent.total_downloads(),
        options.out.display()
    );

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use crate::visualization::ChartError;

    fn offline_options(tmp_dir: &TempDir, history: &str) -> PlotOptions {
        let history_csv = tmp_dir.path().join("history.csv");
        fs::write(&history_csv, history).unwrap();

        PlotOptions {
            package: "Demo_Package".to_string(),
            out: tmp_dir.path().join("chart.svg"),
            history_csv: Some(history_csv),
            days: 365,
            offline: true,
            title: None,
            api_url: "http://127.0.0.1:9/api".to_string(),
            timeout: 1,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    #[test]
    fn test_offline_renders_from_history() {
        let tmp_dir = TempDir::new().unwrap();
        let options = offline_options(&tmp_dir, "date,downloads\n2024-01-01,5\n2024-01-03,7\n");

        run_at(&options, today()).unwrap();

        let svg = fs::read_to_string(&options.out).unwrap();
        assert!(svg.contains("last 3 days: Demo_Package"));
    }

    #[test]
    fn test_offline_does_not_rewrite_history() {
        let tmp_dir = TempDir::new().unwrap();
        let raw = "date,downloads\n2024-01-01,5\n2024-01-03,7\n";
        let options = offline_options(&tmp_dir, raw);

        run_at(&options, today()).unwrap();

        let history = fs::read_to_string(options.history_csv.as_ref().unwrap()).unwrap();
        assert_eq!(history, raw);
    }

    #[test]
    fn test_offline_renders_huge_counts() {
        let tmp_dir = TempDir::new().unwrap();
        let options = offline_options(
            &tmp_dir,
            "date,downloads\n2024-01-01,18446744073709551615\n2024-01-02,1\n",
        );
        run_at(&options, today()).unwrap();
        assert!(options.out.exists());

        let tmp_dir = TempDir::new().unwrap();
        let options = offline_options(&tmp_dir, "date,downloads\n2024-01-01,15000000000000000000\n");
        run_at(&options, today()).unwrap();
        assert!(options.out.exists());
    }

    #[test]
    fn test_offline_without_history_fails() {
        let tmp_dir = TempDir::new().unwrap();
        let mut options = offline_options(&tmp_dir, "");
        options.history_csv = Some(tmp_dir.path().join("missing.csv"));

        let err = run_at(&options, today()).unwrap_err();
        assert!(err.to_string().contains("--offline"));
    }

    #[test]
    fn test_empty_window_fails() {
        let tmp_dir = TempDir::new().unwrap();
        // All history lies after "today"
        let options = offline_options(&tmp_dir, "date,downloads\n2024-02-01,5\n");

        let err = run_at(&options, today()).unwrap_err();
        assert!(err.downcast_ref::<ChartError>().is_some());
        assert!(!options.out.exists());
    }

    #[test]
    fn test_fetch_failure_propagates() {
        let tmp_dir = TempDir::new().unwrap();
        let mut options = offline_options(&tmp_dir, "date,downloads\n2024-01-01,5\n");
        options.offline = false;

        assert!(run_at(&options, today()).is_err());
        assert!(!options.out.exists());
    }
}

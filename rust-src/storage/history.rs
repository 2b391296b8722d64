//! CSV persistence for daily download history.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::{DailyCount, Series};


/// Header columns of the history file.
pub const HISTORY_HEADER: [&str; 2] = ["date", "downloads"];


/// Load download history from a CSV file.
///
/// A missing file is treated as empty history. Counts that are missing or
/// not a non-negative integer are read as 0; rows whose date cannot be
/// parsed are skipped.
pub fn load_history(path: &Path) -> Result<Series> {
    if !path.exists() {
        debug!(path = %path.display(), "no history file yet");
        return Ok(Series::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open history file: {}", path.display()))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header in {}", path.display()))?
        .clone();

    let date_idx = column_index(&headers, HISTORY_HEADER[0]).unwrap_or(0);
    let downloads_idx = column_index(&headers, HISTORY_HEADER[1]).unwrap_or(1);

    let mut counts = Vec::new();

    for (row_num, row_result) in reader.records().enumerate() {
        let row = match row_result {
            Ok(r) => r,
            Err(e) => {
                warn!(path = %path.display(), row = row_num + 2, error = %e, "skipping unreadable row");
                continue;
            }
        };

        let raw_date = row.get(date_idx).unwrap_or("");
        let Some(date) = parse_date(raw_date) else {
            warn!(path = %path.display(), row = row_num + 2, value = raw_date, "skipping row with invalid date");
            continue;
        };

        let raw_downloads = row.get(downloads_idx).unwrap_or("");
        let downloads = coerce_count(raw_downloads).unwrap_or_else(|| {
            warn!(%date, value = raw_downloads, "invalid download count, using 0");
            0
        });

        counts.push(DailyCount::new(date, downloads));
    }

    let series = Series::from_counts(counts);
    debug!(path = %path.display(), rows = series.len(), "loaded history");

    Ok(series)
}


/// Overwrite the history file with `series`.
///
/// Rows are written to a temporary sibling file which then replaces the
/// target, so the previous history survives a failed write. The temporary
/// file is removed when any step fails.
pub fn save_history(path: &Path, series: &Series) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let tmp_path = temp_path_for(path);

    let result = write_rows(&tmp_path, series).and_then(|()| {
        fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to replace history file: {}", path.display()))
    });

    if result.is_err() && tmp_path.exists() {
        let _ = fs::remove_file(&tmp_path);
    }
    result?;

    debug!(path = %path.display(), rows = series.len(), "saved history");

    Ok(())
}


/// Write the header and one row per day to `path`.
fn write_rows(path: &Path, series: &Series) -> Result<()> {
    // Header is written by hand so an empty series still gets one
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(HISTORY_HEADER)?;
    for point in series {
        writer.serialize(point)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}


/// Parse a count leniently: integers, or non-negative floats such as `12.0`
/// or `7.9`, which are truncated toward zero.
pub(crate) fn coerce_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u64>() {
        return Some(n);
    }

    raw.parse::<f64>().ok().and_then(count_from_f64)
}


/// Truncate a finite non-negative float to a count.
pub(crate) fn count_from_f64(value: f64) -> Option<u64> {
    // `as` saturates values above u64::MAX
    (value.is_finite() && value >= 0.0).then(|| value.trunc() as u64)
}


/// Parse `YYYY-MM-DD`, optionally followed by a ` ` or `T` time component.
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day_part = raw
        .split_once(|c: char| c == ' ' || c == 'T')
        .map_or(raw, |(day, _)| day);
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d").ok()
}


fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}


fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "history.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}

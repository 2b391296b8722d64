//! Application settings and path constants.

use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;


/// Base URL of the pypistats.org API.
pub const DEFAULT_API_URL: &str = "https://pypistats.org/api";

/// Timeout for the statistics request (seconds).
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 60;

/// Number of trailing days shown in the chart.
pub const DEFAULT_WINDOW_DAYS: usize = 365;

/// Category preferred when the API reports several.
pub const PREFERRED_CATEGORY: &str = "without_mirrors";

/// Directory holding history files when no path is given.
pub const DEFAULT_HISTORY_DIR: &str = "data";


/// Normalize a package name the way PyPI does (PEP 503).
///
/// Runs of `-`, `_` and `.` collapse to a single `-` and the result is
/// lowercased.
pub fn normalize_package_name(name: &str) -> Result<String> {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();

    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Package name must not be empty");
    }

    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[-_.]+").expect("valid regex"));
    let normalized = separators.replace_all(name, "-").to_lowercase();

    if normalized.chars().any(|c| !(c.is_ascii_alphanumeric() || c == '-')) {
        anyhow::bail!("Invalid package name: {name}");
    }

    Ok(normalized)
}


/// Get the default history path for a normalized package name.
pub fn default_history_path(package: &str) -> PathBuf {
    PathBuf::from(DEFAULT_HISTORY_DIR).join(format!("{package}_downloads.csv"))
}

//! Client for the pypistats.org "overall" downloads endpoint.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PREFERRED_CATEGORY;
use crate::models::{DailyCount, Series};
use crate::storage::{coerce_count, count_from_f64, parse_date};


/// Errors raised while fetching download statistics.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("pypistats returned HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed response from pypistats: {0}")]
    Decode(#[from] serde_json::Error),
}


/// Body of the `overall` endpoint. Rows are decoded one at a time so a
/// malformed row does not discard the rest.
#[derive(Debug, Deserialize)]
struct OverallResponse {
    #[serde(default)]
    data: Option<Vec<Value>>,
}


/// One row of the `overall` endpoint, read leniently.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub downloads: Value,
}


impl RawRecord {
    /// Category label, with missing labels mapped to the empty string.
    fn category_key(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }
}


/// Blocking pypistats API client.
pub struct PypiStatsClient {
    http: reqwest::blocking::Client,
    base_url: String,
}


impl PypiStatsClient {
    /// Create a client for `base_url` with a fixed request timeout.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| FetchError::Network {
                url: base_url.to_string(),
                source,
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the overall-downloads endpoint for a package.
    pub fn overall_url(&self, package: &str) -> String {
        format!("{}/packages/{}/overall", self.base_url, package)
    }

    /// Fetch daily downloads for `package` across all of its releases.
    ///
    /// Any transport failure or non-success status is returned as an error;
    /// a response without data yields an empty series.
    pub fn fetch_overall(&self, package: &str) -> Result<Series, FetchError> {
        let url = self.overall_url(package);
        info!(%url, "fetching download statistics");

        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|source| FetchError::Network { url: url.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url, status });
        }

        let body = response
            .text()
            .map_err(|source| FetchError::Network { url: url.clone(), source })?;

        let series = parse_overall(&body)?;
        debug!(%url, days = series.len(), "parsed download statistics");

        Ok(series)
    }
}


/// Parse an `overall` response body into a series for one category.
pub fn parse_overall(body: &str) -> Result<Series, FetchError> {
    let response: OverallResponse = serde_json::from_str(body)?;
    let records: Vec<RawRecord> = response
        .data
        .unwrap_or_default()
        .into_iter()
        .filter_map(|row| match serde_json::from_value::<RawRecord>(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "skipping malformed record");
                None
            }
        })
        .collect();

    if records.is_empty() {
        return Ok(Series::new());
    }

    let Some(category) = select_category(&records) else {
        return Ok(Series::new());
    };
    debug!(category = %category, "selected category");

    let counts = records
        .iter()
        .filter(|r| r.category_key() == category)
        .filter_map(|record| {
            let raw_date = record.date.as_deref().unwrap_or("");
            let Some(date) = parse_date(raw_date) else {
                warn!(value = raw_date, "skipping record with invalid date");
                return None;
            };
            Some(DailyCount::new(date, downloads_value(&record.downloads)))
        });

    Ok(Series::from_counts(counts))
}


/// Choose which category's counts to use.
///
/// `without_mirrors` wins when present. Otherwise the labelled category with
/// the most distinct dates is used, ties going to the alphabetically first
/// label. Unlabelled records are used only when no labelled ones exist.
pub fn select_category(records: &[RawRecord]) -> Option<String> {
    if records.iter().any(|r| r.category_key() == PREFERRED_CATEGORY) {
        return Some(PREFERRED_CATEGORY.to_string());
    }

    let mut dates_by_category: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for record in records {
        dates_by_category
            .entry(record.category_key())
            .or_default()
            .insert(record.date.as_deref().unwrap_or(""));
    }

    let labelled = dates_by_category
        .iter()
        .filter(|(category, _)| !category.is_empty())
        // BTreeMap iterates in label order; keep the first of equal widths
        .fold(None::<(&str, usize)>, |best, (category, dates)| match best {
            Some((_, width)) if width >= dates.len() => best,
            _ => Some((*category, dates.len())),
        });

    match labelled {
        Some((category, _)) => Some(category.to_string()),
        None if dates_by_category.contains_key("") => Some(String::new()),
        None => None,
    }
}


/// Coerce a `downloads` value to a count, mapping anything unusable to 0.
///
/// Fractional counts are truncated toward zero.
fn downloads_value(value: &Value) -> u64 {
    let count = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(count_from_f64)),
        Value::String(s) => coerce_count(s),
        _ => None,
    };

    count.unwrap_or_else(|| {
        warn!(value = %value, "invalid download count, using 0");
        0
    })
}

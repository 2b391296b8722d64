//! Daily download count and series models.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;


/// Downloads recorded for a single calendar day.
///
/// Serializes as a `date,downloads` history row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub downloads: u64,
}


impl DailyCount {
    pub fn new(date: NaiveDate, downloads: u64) -> Self {
        Self { date, downloads }
    }
}


/// Date-ordered collection of daily counts with at most one entry per date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Series {
    points: Vec<DailyCount>,
}


impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from counts in any order.
    ///
    /// When a date appears more than once, the count that comes last wins.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = DailyCount>,
    {
        let by_date: BTreeMap<NaiveDate, u64> = counts
            .into_iter()
            .map(|c| (c.date, c.downloads))
            .collect();

        Self::from_sorted_map(by_date)
    }

    pub(crate) fn from_sorted_map(by_date: BTreeMap<NaiveDate, u64>) -> Self {
        Self {
            points: by_date
                .into_iter()
                .map(|(date, downloads)| DailyCount { date, downloads })
                .collect(),
        }
    }

    pub fn points(&self) -> &[DailyCount] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DailyCount> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    /// Look up the count for a date.
    pub fn get(&self, date: NaiveDate) -> Option<u64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|idx| self.points[idx].downloads)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.get(date).is_some()
    }

    /// Largest single-day count (0 for an empty series).
    pub fn max_downloads(&self) -> u64 {
        self.points.iter().map(|p| p.downloads).max().unwrap_or(0)
    }

    /// Sum of all counts, saturating at `u64::MAX`.
    pub fn total_downloads(&self) -> u64 {
        self.points
            .iter()
            .fold(0u64, |total, p| total.saturating_add(p.downloads))
    }
}


impl FromIterator<DailyCount> for Series {
    fn from_iter<T: IntoIterator<Item = DailyCount>>(iter: T) -> Self {
        Self::from_counts(iter)
    }
}


impl<'a> IntoIterator for &'a Series {
    type Item = &'a DailyCount;
    type IntoIter = std::slice::Iter<'a, DailyCount>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

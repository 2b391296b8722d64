//! Merging, gap-filling and windowing of daily download series.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::models::{DailyCount, Series};


/// Merge freshly fetched counts into existing history.
///
/// The result holds every date from both inputs; where a date is present in
/// both, the count from `new` is kept.
pub fn merge(existing: &Series, new: &Series) -> Series {
    let mut by_date: BTreeMap<NaiveDate, u64> = existing
        .iter()
        .map(|p| (p.date, p.downloads))
        .collect();

    for point in new {
        by_date.insert(point.date, point.downloads);
    }

    Series::from_sorted_map(by_date)
}


/// Expand a series into one entry per calendar day between its first and
/// last date, inserting zero for missing days.
pub fn fill_gaps(series: &Series) -> Series {
    let (Some(start), Some(end)) = (series.first_date(), series.last_date()) else {
        return Series::new();
    };

    let mut filled = Vec::with_capacity((end - start).num_days() as usize + 1);
    let mut current_date = start;

    while current_date <= end {
        let downloads = series.get(current_date).unwrap_or(0);
        filled.push(DailyCount::new(current_date, downloads));
        current_date += Duration::days(1);
    }

    Series::from_counts(filled)
}


/// Trailing window of `days` calendar days.
///
/// The window ends at `today` when the series has an entry for it, and
/// otherwise at the latest entry not after `today`. Nothing past `today` or
/// past the last entry is ever returned.
pub fn window(series: &Series, days: usize, today: NaiveDate) -> Series {
    if days == 0 {
        return Series::new();
    }

    let end = if series.contains(today) {
        Some(today)
    } else {
        series.iter().rev().map(|p| p.date).find(|date| *date <= today)
    };

    let Some(end) = end else {
        return Series::new();
    };

    // Looking back further than the whole series changes nothing
    let lookback = (days - 1).min(span_days(series) as usize);
    let start = end - Duration::days(lookback as i64);

    series
        .iter()
        .filter(|p| p.date >= start && p.date <= end)
        .copied()
        .collect()
}


/// Number of days covered by a series, first to last inclusive.
pub fn span_days(series: &Series) -> i64 {
    match (series.first_date(), series.last_date()) {
        (Some(start), Some(end)) => (end - start).num_days() + 1,
        _ => 0,
    }
}

//! Data models for download statistics.

mod daily_count;

pub use daily_count::{DailyCount, Series};

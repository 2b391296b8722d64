//! Remote download statistics.

mod pypistats;

#[allow(unused_imports)]
pub use pypistats::{parse_overall, select_category, FetchError, PypiStatsClient, RawRecord};

//! Storage layer for download history.

mod history;

#[allow(unused_imports)]
pub use history::{load_history, save_history, HISTORY_HEADER};
pub(crate) use history::{coerce_count, count_from_f64, parse_date};

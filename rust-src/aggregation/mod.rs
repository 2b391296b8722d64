//! Series operations over daily download history.

mod series;

pub use series::{fill_gaps, merge, span_days, window};

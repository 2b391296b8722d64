//! Configuration and settings.

mod settings;

#[allow(unused_imports)]
pub use settings::{
    default_history_path,
    normalize_package_name,
    DEFAULT_API_URL,
    DEFAULT_HISTORY_DIR,
    DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_WINDOW_DAYS,
    PREFERRED_CATEGORY,
};

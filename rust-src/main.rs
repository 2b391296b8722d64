//! pypi-downloads CLI
//!
//! Daily PyPI download history and charts from pypistats.org.

mod aggregation;
mod cli;
mod commands;
mod config;
mod data;
mod models;
mod storage;
mod visualization;


fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::plot::{self, PlotOptions};
use crate::config::{DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_WINDOW_DAYS};


/// Fetch daily PyPI download counts, keep a CSV history, and chart it
#[derive(Parser)]
#[command(name = "pypi-downloads")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Package name on PyPI
    #[arg(long, env = "PYPI_DOWNLOADS_PACKAGE")]
    package: String,

    /// Output image path (.png, or .svg for vector output)
    #[arg(long)]
    out: PathBuf,

    /// History CSV path (default: data/<package>_downloads.csv)
    #[arg(long)]
    history_csv: Option<PathBuf>,

    /// Number of trailing days to plot
    #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    days: usize,

    /// Skip fetching, plot from existing history only
    #[arg(long)]
    offline: bool,

    /// Chart title
    #[arg(long)]
    title: Option<String>,

    /// pypistats API base URL
    #[arg(long, env = "PYPISTATS_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT)]
    timeout: u64,

    /// Log progress details to stderr
    #[arg(short, long)]
    verbose: bool,
}


/// Run the CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let options = PlotOptions {
        package: cli.package,
        out: cli.out,
        history_csv: cli.history_csv,
        days: cli.days,
        offline: cli.offline,
        title: cli.title,
        api_url: cli.api_url,
        timeout: cli.timeout,
    };

    plot::run(&options)
}


/// Set up stderr logging. `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,pypi_downloads={level}")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}


#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["pypi-downloads", "--package", "numpy", "--out", "a.png"]).unwrap();
        assert_eq!(cli.days, DEFAULT_WINDOW_DAYS);
        assert_eq!(cli.timeout, DEFAULT_REQUEST_TIMEOUT);
        assert!(!cli.offline);
        assert!(cli.history_csv.is_none());
    }

    #[test]
    fn test_out_is_required() {
        assert!(Cli::try_parse_from(["pypi-downloads", "--package", "numpy"]).is_err());
    }
}

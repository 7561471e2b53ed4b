//! The `dsbulk` binary. The CLI lives in `cli/`; this file only sets up
//! logging, calls `cli::run()` and turns errors into exit codes.

use colored::Colorize;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn main() {
    let cli = cli::parse();
    init_tracing(cli.verbose());

    if let Err(e) = cli::run(cli) {
        debug!(error = ?e, "command failed");
        eprintln!("{} {}", "Error:".red(), e);
        if e.is_usage_error() {
            eprint!("{}", cli::usage());
        }
        std::process::exit(1);
    }
}

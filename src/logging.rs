//! Diagnostic logging to stderr.
//!
//! User-facing output goes through [`crate::ui`]; the log is for tracing what
//! happened on disk. It is quiet unless asked for with `-v`.

use std::io::{self, IsTerminal};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive for the given verbosity flags
///
/// `quiet` wins over `verbose`: 0 = warn, 1 = info, 2 = debug, 3+ = trace.
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "facprof=error";
    }
    match verbose {
        0 => "facprof=warn",
        1 => "facprof=info",
        2 => "facprof=debug",
        _ => "facprof=trace",
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the flags.
pub fn init_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .compact()
        .with_writer(io::stderr);

    // A subscriber may already be set (e.g. by a test harness)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

//! Logging setup and small formatting helpers
//!
//! Standard output carries the BAM stream, so all log output goes to
//! standard error.

use std::io::IsTerminal;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` takes precedence when set.
pub fn init(verbose: bool) {
    let default = if verbose { "addrgrs=debug,info" } else { "addrgrs=info,warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

/// Elapsed time for the closing "wrote N records in ..." line.
///
/// Short runs keep a tenth of a second; long merges drop to whole seconds.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    match (secs / 3600, secs / 60 % 60, secs % 60) {
        (0, 0, _) => format!("{:.1} sec", elapsed.as_secs_f64()),
        (0, min, sec) => format!("{min} min {sec} sec"),
        (hours, min, sec) => format!("{hours} h {min} min {sec} sec"),
    }
}

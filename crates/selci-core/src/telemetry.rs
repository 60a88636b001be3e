//! Tracing initialisation for selci binaries.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level` for filtering. When `json` is
/// set, log lines are newline-delimited JSON for aggregation pipelines.
///
/// Safe to call more than once; the global subscriber can only be set once
/// per process, so later calls are no-ops.
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let initialised = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    let _ = initialised;
}

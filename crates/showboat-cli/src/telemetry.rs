//! Structured telemetry initialisation for the CLI.

use std::io::{self, IsTerminal};

use tracing_subscriber::EnvFilter;

/// Environment variable controlling the log filter, such as
/// `SHOWBOAT_LOG=debug`.
pub(crate) const LOG_FILTER_ENV: &str = "SHOWBOAT_LOG";

/// Installs the global tracing subscriber, writing to stderr.
///
/// Defaults to `warn` so operator-facing warnings surface without flooding
/// normal runs. A second invocation leaves the existing subscriber in place.
pub(crate) fn initialise() {
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let already_installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .try_init()
        .is_err();
    if already_installed {
        tracing::debug!("telemetry already initialised");
    }
}

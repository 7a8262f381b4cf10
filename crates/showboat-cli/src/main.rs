//! CLI entrypoint for the showboat demo-document tool.
//!
//! The binary delegates to [`showboat_cli::run`], which initialises
//! telemetry, parses command-line arguments, and dispatches to document
//! operations.

use std::process::ExitCode;

fn main() -> ExitCode {
    showboat_cli::run()
}

//! Error types for the CLI runtime.

use std::io;

use thiserror::Error;

use showboat_ops::OpsError;

/// Errors surfaced to the operator by the CLI.
#[derive(Debug, Error)]
pub(crate) enum AppError {
    /// A document operation failed.
    #[error(transparent)]
    Ops(#[from] OpsError),
    /// Reading the fallback stdin input failed.
    #[error("failed to read stdin: {0}")]
    ReadStdin(io::Error),
    /// Writing to stdout failed.
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
    /// Installing signal handlers for the server wait loop failed.
    #[cfg(unix)]
    #[error("failed to install signal handlers: {0}")]
    InstallSignals(io::Error),
}

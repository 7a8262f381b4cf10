//! Error types for subprocess and image operations.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors from running code, managing servers, or capturing images.
///
/// A non-zero exit code from executed code is never an error; it is
/// captured as data. These variants cover failures to launch or coordinate
/// processes at all.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecError {
    /// The interpreter process could not be started.
    #[error("launching {interpreter}: {source}")]
    Launch {
        /// The interpreter that failed to start.
        interpreter: String,
        /// The underlying launch failure.
        source: io::Error,
    },

    /// The output filter pipeline could not be run.
    #[error("running filter {filter:?}: {source}")]
    Filter {
        /// The filter command that failed.
        filter: String,
        /// The underlying failure.
        source: io::Error,
    },

    /// No free TCP port could be allocated.
    #[error("finding free port: {source}")]
    NoFreePort {
        /// The underlying bind failure.
        source: io::Error,
    },

    /// A server never accepted connections within the readiness deadline.
    /// Distinct from a generic I/O failure: the process started but the
    /// port never opened.
    #[error("timeout waiting for port {port} after {timeout:?}")]
    PortTimeout {
        /// The port that never became ready.
        port: u16,
        /// The deadline that elapsed.
        timeout: Duration,
    },

    /// The image path does not exist or is not a regular file.
    #[error("image file not found: {}", path.display())]
    ImageNotFound {
        /// The path that was checked.
        path: PathBuf,
    },

    /// The image extension is not a recognised image format.
    #[error("unrecognized image format: {extension:?}")]
    UnrecognizedImageFormat {
        /// The offending extension, lowercased.
        extension: String,
    },

    /// Copying the image next to the document failed.
    #[error("copying image to {}: {source}", path.display())]
    ImageCopy {
        /// The destination path.
        path: PathBuf,
        /// The underlying copy failure.
        source: io::Error,
    },
}

impl ExecError {
    /// Creates a launch error.
    #[must_use]
    pub fn launch(interpreter: impl Into<String>, source: io::Error) -> Self {
        Self::Launch {
            interpreter: interpreter.into(),
            source,
        }
    }

    /// Creates a filter error.
    #[must_use]
    pub fn filter(filter: impl Into<String>, source: io::Error) -> Self {
        Self::Filter {
            filter: filter.into(),
            source,
        }
    }

    /// Creates a port readiness timeout error.
    #[must_use]
    pub const fn port_timeout(port: u16, timeout: Duration) -> Self {
        Self::PortTimeout { port, timeout }
    }
}

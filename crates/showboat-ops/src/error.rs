//! Error types for document operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use showboat_exec::ExecError;
use showboat_markdown::ParseError;

/// Errors from the document operations, verifier, and extractor.
///
/// Drift found by verification is not an error; it is the verifier's
/// result. These variants cover failures that abort an operation before it
/// can produce a result, always leaving the on-disk document unchanged.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum OpsError {
    /// `init` refuses to overwrite an existing document.
    #[error("file already exists: {}", path.display())]
    AlreadyExists {
        /// The path that already exists.
        path: PathBuf,
    },

    /// The document to operate on does not exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Reading the document failed.
    #[error("reading {}: {source}", path.display())]
    Read {
        /// The document path.
        path: PathBuf,
        /// The underlying read failure.
        source: io::Error,
    },

    /// Writing the document failed. The content was fully built in memory
    /// first, so a failure here never leaves a half-written original.
    #[error("writing {}: {source}", path.display())]
    Write {
        /// The destination path.
        path: PathBuf,
        /// The underlying write failure.
        source: io::Error,
    },

    /// The document is not in the expected format.
    #[error("parsing {}: {source}", path.display())]
    Parse {
        /// The document path.
        path: PathBuf,
        /// The parse failure, with enough context to locate the region.
        source: ParseError,
    },

    /// A subprocess, server, or image operation failed.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// `pop` on a document with no blocks at all.
    #[error("document is empty")]
    EmptyDocument,

    /// `pop` on a document containing only its title.
    #[error("nothing to pop: document only contains a title")]
    OnlyTitle,

    /// `server` on a document without any server-annotated code block.
    #[error("no {{server}} block found in {}", path.display())]
    NoServerBlock {
        /// The document path.
        path: PathBuf,
    },

    /// Formatting the creation timestamp failed.
    #[error("formatting timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
}

impl OpsError {
    /// Creates a read error for `path`.
    #[must_use]
    pub fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a write error for `path`.
    #[must_use]
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse error for `path`.
    #[must_use]
    pub fn parse(path: impl Into<PathBuf>, source: ParseError) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}

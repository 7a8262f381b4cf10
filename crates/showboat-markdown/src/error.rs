//! Error types for document parsing.

use thiserror::Error;

/// Errors from parsing a showboat document.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// A fence was opened but never closed by a line of matching width.
    #[error("unterminated fence of width {width} opened on line {line}")]
    UnterminatedFence {
        /// One-based line number of the opening fence.
        line: usize,
        /// Number of backticks in the opening fence.
        width: usize,
    },

    /// A code block carried both the `{image}` and `{server}` annotations.
    #[error("code block on line {line} is annotated as both image and server")]
    ConflictingAnnotations {
        /// One-based line number of the opening fence.
        line: usize,
    },
}

impl ParseError {
    /// Creates an unterminated fence error.
    #[must_use]
    pub const fn unterminated_fence(line: usize, width: usize) -> Self {
        Self::UnterminatedFence { line, width }
    }

    /// Creates a conflicting annotations error.
    #[must_use]
    pub const fn conflicting_annotations(line: usize) -> Self {
        Self::ConflictingAnnotations { line }
    }
}

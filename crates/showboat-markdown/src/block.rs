//! Block types shared by every component that reads or writes documents.
//!
//! The model is pure data: a closed variant set with no behaviour beyond a
//! few accessor conveniences. Validation belongs to the parser, the writer,
//! and the operations that rely on block adjacency.

/// One structural unit of a showboat document.
///
/// Document order is significant and is the only structure: blocks never
/// nest. Serialisation matches exhaustively over this enum, so adding a
/// variant without teaching the writer about it is a compile error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// The document header. At most one, always at index 0 when present.
    Title(TitleBlock),
    /// Free-form markdown prose.
    Commentary(CommentaryBlock),
    /// An executable fenced code block.
    Code(CodeBlock),
    /// Captured text output of the immediately preceding code block.
    Output(OutputBlock),
    /// A generated image reference following an image code block.
    ImageOutput(ImageOutputBlock),
}

impl Block {
    /// Returns the code block payload when this block is code.
    #[must_use]
    pub const fn as_code(&self) -> Option<&CodeBlock> {
        match self {
            Self::Code(code) => Some(code),
            _ => None,
        }
    }

    /// Returns the output payload when this block is captured output.
    #[must_use]
    pub const fn as_output(&self) -> Option<&OutputBlock> {
        match self {
            Self::Output(output) => Some(output),
            _ => None,
        }
    }
}

/// The document header: an H1 title plus a timestamp dateline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TitleBlock {
    /// The H1 heading text.
    pub title: String,
    /// ISO-8601 creation timestamp. Empty when the dateline was malformed.
    pub timestamp: String,
    /// Tool version recorded in the dateline, e.g. `v0.1.0`.
    pub version: Option<String>,
    /// Stable document identifier carried in an HTML comment.
    pub document_id: Option<String>,
}

/// Free-form prose between other blocks.
///
/// Internal blank lines are preserved verbatim; blank lines at the block
/// boundaries are structural separators and are trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentaryBlock {
    /// The prose, without a trailing newline.
    pub text: String,
}

/// An executable fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// The interpreter the code is run with, e.g. `bash` or `python3`.
    pub language: String,
    /// The code itself, without a trailing newline.
    pub code: String,
    /// Whether the block produces an image rather than text output.
    pub is_image: bool,
    /// Whether the block starts a long-lived server process.
    pub is_server: bool,
    /// Shell command the captured output is piped through before recording.
    pub filter: Option<String>,
}

impl CodeBlock {
    /// Creates a plain code block with no annotations.
    #[must_use]
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
            is_image: false,
            is_server: false,
            filter: None,
        }
    }
}

/// Captured text output paired with the preceding code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBlock {
    /// The captured output. Every line is newline-terminated.
    pub content: String,
    /// Optional language tag for syntax highlighting. When set the fence is
    /// rendered with this tag instead of the literal `output` token, which
    /// demotes the block to a display-only form.
    pub language: Option<String>,
}

impl OutputBlock {
    /// Creates an output block with the literal `output` fence token.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            language: None,
        }
    }
}

/// A markdown image reference produced by an image code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOutputBlock {
    /// Alt text for the image reference.
    pub alt_text: String,
    /// Filename relative to the document's directory.
    pub filename: String,
}

//! Block model, parser, and writer for showboat documents.
//!
//! A showboat document is a markdown file made of an ordered, flat sequence
//! of [`Block`]s: an optional title header, free-form commentary, executable
//! fenced code blocks, and the captured output of running them. The parser
//! and writer are exact inverses of one another: parsing a document written
//! by [`render`] reproduces the same block sequence, and re-rendering a
//! parsed document reproduces the original bytes.

mod block;
mod error;
mod parser;
mod writer;

pub use block::{Block, CodeBlock, CommentaryBlock, ImageOutputBlock, OutputBlock, TitleBlock};
pub use error::ParseError;
pub use parser::{parse, parse_image_reference};
pub use writer::render;

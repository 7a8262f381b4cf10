//! Line-based parser for showboat documents.
//!
//! The parser is a small state machine over a cursor of lines. All index
//! advancement goes through [`Cursor`], which keeps the blank-separator
//! bookkeeping in one place. Fences are matched by width: a fence opened
//! with N backticks is closed only by a line of exactly N backticks, so
//! output blocks can embed shorter fenced regions verbatim.

use crate::block::{Block, CodeBlock, CommentaryBlock, ImageOutputBlock, OutputBlock, TitleBlock};
use crate::error::ParseError;

/// Marker separating the timestamp from the tool version in the dateline.
const DATELINE_SEPARATOR: &str = " by Showboat ";

/// Prefix and suffix wrapping the document identifier comment.
const DOC_ID_PREFIX: &str = "<!-- showboat-id: ";
const DOC_ID_SUFFIX: &str = " -->";

/// Parses a document into its ordered block sequence.
///
/// The input is expected to be in the format produced by [`crate::render`].
/// Absent optional title parts (dateline, document identifier) never shift
/// the parse of subsequent blocks, and a malformed dateline degrades to an
/// empty timestamp rather than failing.
///
/// # Errors
///
/// Returns [`ParseError::UnterminatedFence`] when a fence is never closed by
/// a line of matching width, and [`ParseError::ConflictingAnnotations`] when
/// a code block is annotated as both `{image}` and `{server}`.
pub fn parse(input: &str) -> Result<Vec<Block>, ParseError> {
    let mut cursor = Cursor::new(input);
    let mut blocks = Vec::new();

    while let Some(line) = cursor.peek() {
        // Title block: only at the very beginning of the document.
        if blocks.is_empty()
            && let Some(title) = line.strip_prefix("# ")
        {
            blocks.push(Block::Title(parse_title(&mut cursor, title)));
            cursor.eat_separator();
            continue;
        }

        if line.starts_with("```") {
            blocks.push(parse_fenced(&mut cursor)?);
            cursor.eat_separator();
            continue;
        }

        if line.starts_with("![")
            && let Some((alt_text, filename)) = parse_image_reference(line)
        {
            cursor.advance();
            blocks.push(Block::ImageOutput(ImageOutputBlock { alt_text, filename }));
            cursor.eat_separator();
            continue;
        }

        if let Some(commentary) = parse_commentary(&mut cursor) {
            blocks.push(Block::Commentary(commentary));
        }
    }

    Ok(blocks)
}

/// Extracts the alt text and filename from a `![alt](filename)` reference.
///
/// Returns `None` when the line is not a complete image reference or the
/// filename is empty, in which case the line is ordinary commentary.
#[must_use]
pub fn parse_image_reference(line: &str) -> Option<(String, String)> {
    let start = line.find("![")?;
    let rest = line.get(start + 2..)?;
    let (alt, rest) = rest.split_once("](")?;
    let (filename, _) = rest.split_once(')')?;
    if filename.is_empty() {
        return None;
    }
    Some((alt.to_owned(), filename.to_owned()))
}

/// Cursor over the input lines with centralised advancement.
struct Cursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<&'a str> {
        let line = self.peek();
        if line.is_some() {
            self.pos += 1;
        }
        line
    }

    /// Consumes a single blank separator line between blocks, if present.
    fn eat_separator(&mut self) {
        if self.peek() == Some("") {
            self.pos += 1;
        }
    }

    /// One-based number of the current line.
    const fn line_number(&self) -> usize {
        self.pos + 1
    }
}

fn parse_title(cursor: &mut Cursor<'_>, title: &str) -> TitleBlock {
    cursor.advance(); // past the "# ..." line
    cursor.eat_separator();

    let mut timestamp = String::new();
    let mut version = None;
    if let Some(line) = cursor.peek()
        && line.starts_with('*')
        && line.ends_with('*')
    {
        let dateline = line.trim_matches('*');
        match dateline.split_once(DATELINE_SEPARATOR) {
            Some((stamp, tool_version)) => {
                timestamp = stamp.to_owned();
                version = Some(tool_version.to_owned());
            }
            None => timestamp = dateline.to_owned(),
        }
        cursor.advance();
    }

    let mut document_id = None;
    if let Some(line) = cursor.peek()
        && let Some(id) = line
            .strip_prefix(DOC_ID_PREFIX)
            .and_then(|rest| rest.strip_suffix(DOC_ID_SUFFIX))
    {
        document_id = Some(id.to_owned());
        cursor.advance();
    }

    TitleBlock {
        title: title.to_owned(),
        timestamp,
        version,
        document_id,
    }
}

fn parse_fenced(cursor: &mut Cursor<'_>) -> Result<Block, ParseError> {
    let opening_line = cursor.line_number();
    let Some(opener) = cursor.advance() else {
        return Err(ParseError::unterminated_fence(opening_line, 3));
    };

    let width = opener.chars().take_while(|&c| c == '`').count();
    let info = opener.get(width..).unwrap_or_default();
    let closing = "`".repeat(width);

    if info == "output" {
        let mut content = String::new();
        loop {
            match cursor.advance() {
                Some(line) if line == closing => break,
                Some(line) => {
                    content.push_str(line);
                    content.push('\n');
                }
                None => return Err(ParseError::unterminated_fence(opening_line, width)),
            }
        }
        return Ok(Block::Output(OutputBlock::new(content)));
    }

    let (language, is_image, is_server, filter) = parse_info_string(info, opening_line)?;
    let mut code_lines = Vec::new();
    loop {
        match cursor.advance() {
            Some(line) if line == closing => break,
            Some(line) => code_lines.push(line),
            None => return Err(ParseError::unterminated_fence(opening_line, width)),
        }
    }

    Ok(Block::Code(CodeBlock {
        language,
        code: code_lines.join("\n"),
        is_image,
        is_server,
        filter,
    }))
}

/// Splits a fence info string into the language tag and its annotations.
///
/// The `{image}`, `{server}`, and `{filter=name}` annotations may appear in
/// any order after the language tag; each is stripped from the displayed
/// language. A `{filter=` fragment without a closing brace is left in the
/// language tag untouched.
fn parse_info_string(
    info: &str,
    line: usize,
) -> Result<(String, bool, bool, Option<String>), ParseError> {
    const IMAGE: &str = " {image}";
    const SERVER: &str = " {server}";
    const FILTER: &str = " {filter=";

    let mut language = info.to_owned();
    let mut is_image = false;
    let mut is_server = false;
    let mut filter = None;

    loop {
        if let Some(idx) = language.find(IMAGE) {
            language.replace_range(idx..idx + IMAGE.len(), "");
            is_image = true;
            continue;
        }
        if let Some(idx) = language.find(SERVER) {
            language.replace_range(idx..idx + SERVER.len(), "");
            is_server = true;
            continue;
        }
        if let Some(idx) = language.find(FILTER) {
            let value_start = idx + FILTER.len();
            if let Some(len) = language.get(value_start..).and_then(|rest| rest.find('}')) {
                filter = language.get(value_start..value_start + len).map(str::to_owned);
                language.replace_range(idx..value_start + len + 1, "");
                continue;
            }
        }
        break;
    }

    if is_image && is_server {
        return Err(ParseError::conflicting_annotations(line));
    }

    Ok((language, is_image, is_server, filter))
}

fn parse_commentary(cursor: &mut Cursor<'_>) -> Option<CommentaryBlock> {
    let mut text_lines = Vec::new();
    while let Some(line) = cursor.peek() {
        if line.starts_with("```") {
            break;
        }
        if line.starts_with("![") && parse_image_reference(line).is_some() {
            break;
        }
        text_lines.push(line);
        cursor.advance();
    }

    // Trailing blank lines are inter-block separators, not content.
    while text_lines.last() == Some(&"") {
        text_lines.pop();
    }

    if text_lines.is_empty() {
        return None;
    }
    Some(CommentaryBlock {
        text: text_lines.join("\n"),
    })
}

//! Canonical text form of a block sequence.
//!
//! The writer is the inverse of the parser for any sequence the parser can
//! produce. Fence widths are decided independently here by scanning block
//! content for the longest backtick run opening a line and choosing a fence
//! one backtick wider, mirroring the parser's width-matching rule.

use crate::block::{Block, CodeBlock};

/// Serialises a block sequence into its canonical markdown form.
///
/// Exactly one blank separator line is emitted between blocks, and
/// annotation order on code fences is fixed, so repeated parse/render
/// cycles are byte-stable.
#[must_use]
pub fn render(blocks: &[Block]) -> String {
    let mut out = String::new();
    for (index, block) in blocks.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        render_block(&mut out, block);
    }
    out
}

fn render_block(out: &mut String, block: &Block) {
    match block {
        Block::Title(title) => {
            out.push_str("# ");
            out.push_str(&title.title);
            out.push_str("\n\n*");
            out.push_str(&title.timestamp);
            if let Some(version) = &title.version {
                out.push_str(" by Showboat ");
                out.push_str(version);
            }
            out.push_str("*\n");
            if let Some(id) = &title.document_id {
                out.push_str("<!-- showboat-id: ");
                out.push_str(id);
                out.push_str(" -->\n");
            }
        }
        Block::Commentary(commentary) => {
            out.push_str(&commentary.text);
            out.push('\n');
        }
        Block::Code(code) => {
            let fence = fence_for(&code.code);
            out.push_str(&fence);
            out.push_str(&info_string(code));
            out.push('\n');
            out.push_str(&code.code);
            out.push('\n');
            out.push_str(&fence);
            out.push('\n');
        }
        Block::Output(output) => {
            let fence = fence_for(&output.content);
            out.push_str(&fence);
            out.push_str(output.language.as_deref().unwrap_or("output"));
            out.push('\n');
            out.push_str(&output.content);
            if !output.content.is_empty() && !output.content.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&fence);
            out.push('\n');
        }
        Block::ImageOutput(image) => {
            out.push_str("![");
            out.push_str(&image.alt_text);
            out.push_str("](");
            out.push_str(&image.filename);
            out.push_str(")\n");
        }
    }
}

/// Returns the fence info string for a code block: the language tag with
/// annotations appended in a fixed order.
fn info_string(code: &CodeBlock) -> String {
    let mut info = code.language.clone();
    if let Some(filter) = &code.filter {
        info.push_str(" {filter=");
        info.push_str(filter);
        info.push('}');
    }
    if code.is_image {
        info.push_str(" {image}");
    }
    if code.is_server {
        info.push_str(" {server}");
    }
    info
}

/// Chooses a fence wide enough that no line of `content` can close it: one
/// backtick longer than the longest backtick run opening a line, with a
/// minimum width of three.
fn fence_for(content: &str) -> String {
    let longest = content
        .lines()
        .map(|line| line.chars().take_while(|&c| c == '`').count())
        .max()
        .unwrap_or(0);
    let width = if longest >= 3 { longest + 1 } else { 3 };
    "`".repeat(width)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::block::{CommentaryBlock, ImageOutputBlock, OutputBlock, TitleBlock};

    #[test]
    fn renders_title_with_version() {
        let blocks = [Block::Title(TitleBlock {
            title: "My Demo".to_owned(),
            timestamp: "2026-02-06T15:30:00Z".to_owned(),
            version: Some("v0.3.0".to_owned()),
            document_id: None,
        })];
        assert_eq!(
            render(&blocks),
            "# My Demo\n\n*2026-02-06T15:30:00Z by Showboat v0.3.0*\n"
        );
    }

    #[test]
    fn renders_title_without_version() {
        let blocks = [Block::Title(TitleBlock {
            title: "My Demo".to_owned(),
            timestamp: "2026-02-06T15:30:00Z".to_owned(),
            version: None,
            document_id: None,
        })];
        assert_eq!(render(&blocks), "# My Demo\n\n*2026-02-06T15:30:00Z*\n");
    }

    #[test]
    fn renders_title_with_document_id() {
        let blocks = [Block::Title(TitleBlock {
            title: "My Demo".to_owned(),
            timestamp: "2026-02-06T15:30:00Z".to_owned(),
            version: None,
            document_id: Some("abc-123".to_owned()),
        })];
        assert_eq!(
            render(&blocks),
            "# My Demo\n\n*2026-02-06T15:30:00Z*\n<!-- showboat-id: abc-123 -->\n"
        );
    }

    #[test]
    fn renders_code_and_output_with_blank_separator() {
        let blocks = [
            Block::Code(CodeBlock::new("bash", "echo hello")),
            Block::Output(OutputBlock::new("hello\n")),
        ];
        assert_eq!(
            render(&blocks),
            "```bash\necho hello\n```\n\n```output\nhello\n```\n"
        );
    }

    #[test]
    fn renders_image_pair() {
        let blocks = [
            Block::Code(CodeBlock {
                is_image: true,
                ..CodeBlock::new("bash", "python screenshot.py")
            }),
            Block::ImageOutput(ImageOutputBlock {
                alt_text: "Screenshot".to_owned(),
                filename: "abc-2026-02-06.png".to_owned(),
            }),
        ];
        assert_eq!(
            render(&blocks),
            "```bash {image}\npython screenshot.py\n```\n\n![Screenshot](abc-2026-02-06.png)\n"
        );
    }

    #[test]
    fn annotation_order_is_fixed() {
        let blocks = [Block::Code(CodeBlock {
            filter: Some("my-tool".to_owned()),
            is_image: true,
            ..CodeBlock::new("bash", "screenshot")
        })];
        assert_eq!(
            render(&blocks),
            "```bash {filter=my-tool} {image}\nscreenshot\n```\n"
        );
    }

    #[rstest]
    #[case("hello world\n", "```output\nhello world\n```\n")]
    #[case("```bash\necho hello\n```\n", "````output\n```bash\necho hello\n```\n````\n")]
    #[case(
        "````python\nprint('hi')\n````\n",
        "`````output\n````python\nprint('hi')\n````\n`````\n"
    )]
    #[case("``two ticks\n", "```output\n``two ticks\n```\n")]
    fn output_fence_grows_past_content(#[case] content: &str, #[case] expected: &str) {
        let blocks = [Block::Output(OutputBlock::new(content))];
        assert_eq!(render(&blocks), expected);
    }

    #[test]
    fn output_with_language_tag_renders_highlighted_fence() {
        let blocks = [Block::Output(OutputBlock {
            content: "fn main() {}\n".to_owned(),
            language: Some("rust".to_owned()),
        })];
        assert_eq!(render(&blocks), "```rust\nfn main() {}\n```\n");
    }

    #[test]
    fn output_without_trailing_newline_keeps_closing_fence_on_own_line() {
        let blocks = [Block::Output(OutputBlock::new("no newline"))];
        assert_eq!(render(&blocks), "```output\nno newline\n```\n");
    }

    #[test]
    fn renders_full_document() {
        let blocks = [
            Block::Title(TitleBlock {
                title: "Demo".to_owned(),
                timestamp: "2026-02-06T00:00:00Z".to_owned(),
                version: Some("v0.3.0".to_owned()),
                document_id: None,
            }),
            Block::Commentary(CommentaryBlock {
                text: "Let's begin.".to_owned(),
            }),
            Block::Code(CodeBlock::new("bash", "echo hi")),
            Block::Output(OutputBlock::new("hi\n")),
            Block::Commentary(CommentaryBlock {
                text: "Done.".to_owned(),
            }),
        ];
        assert_eq!(
            render(&blocks),
            "# Demo\n\n*2026-02-06T00:00:00Z by Showboat v0.3.0*\n\nLet's begin.\n\n```bash\necho hi\n```\n\n```output\nhi\n```\n\nDone.\n"
        );
    }
}

//! Reconstruction of the command sequence that would rebuild a document.

use std::path::Path;

use showboat_markdown::Block;

use crate::document::read_blocks;
use crate::error::OpsError;

/// Maps a document back to the ordered `showboat` invocations whose replay
/// would reconstruct an equivalent document.
///
/// One command is emitted per title, commentary, and code block; output
/// blocks are derived by replay and never emitted separately. An image
/// reference is emitted as one `image` command, whether or not it is paired
/// with an `{image}` code block. An `{image}` code block with no following
/// reference emits no command, because only the reference carries a filename
/// to replay. Server blocks map to `showboat server`, which is how they are
/// exercised rather than appended. When `filename` is given it replaces the
/// document path in every command.
///
/// # Errors
///
/// Returns read/parse failures for the document itself.
pub fn extract(path: &Path, filename: Option<&str>) -> Result<Vec<String>, OpsError> {
    let blocks = read_blocks(path)?;
    let target = filename.unwrap_or_else(|| path.to_str().unwrap_or_default());

    let mut commands = Vec::new();
    let mut index = 0;
    while index < blocks.len() {
        match blocks.get(index) {
            Some(Block::Title(title)) => {
                commands.push(command(&["showboat", "init", target, &title.title]));
            }
            Some(Block::Commentary(commentary)) => {
                commands.push(command(&["showboat", "note", target, &commentary.text]));
            }
            Some(Block::Code(code)) if code.is_server => {
                commands.push(command(&["showboat", "server", target]));
            }
            Some(Block::Code(code)) if code.is_image => {
                // The paired reference carries the reconstruction arguments;
                // an unpaired image block has no filename to replay, so it
                // contributes nothing.
                if let Some(Block::ImageOutput(image)) = blocks.get(index + 1) {
                    let reference = format!("![{}]({})", image.alt_text, image.filename);
                    commands.push(command(&["showboat", "image", target, reference.as_str()]));
                    index += 2;
                    continue;
                }
            }
            Some(Block::Code(code)) => {
                let mut parts: Vec<&str> =
                    vec!["showboat", "exec", target, code.language.as_str()];
                if let Some(filter) = &code.filter {
                    parts.push("--filter");
                    parts.push(filter.as_str());
                }
                parts.push(code.code.as_str());
                commands.push(command(&parts));
            }
            Some(Block::ImageOutput(image)) => {
                let reference = format!("![{}]({})", image.alt_text, image.filename);
                commands.push(command(&["showboat", "image", target, reference.as_str()]));
            }
            Some(Block::Output(_)) | None => {}
        }
        index += 1;
    }

    Ok(commands)
}

fn command(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|part| shell_quote(part))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quotes an argument for safe replay through a POSIX shell.
///
/// Words made only of unambiguous characters pass through bare; anything
/// else is single-quoted, with embedded single quotes escaped by closing
/// the quote, emitting `\'`, and reopening.
fn shell_quote(argument: &str) -> String {
    const SAFE: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_-./=:@%+,";

    if !argument.is_empty() && argument.chars().all(|c| SAFE.contains(c)) {
        return argument.to_owned();
    }
    let escaped = argument.replace('\'', "'\\''");
    format!("'{escaped}'")
}

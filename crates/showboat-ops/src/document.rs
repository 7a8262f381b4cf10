//! Append-only document operations.
//!
//! Every operation is a read-mutate-write transaction over the whole file:
//! the document is parsed fully, the in-memory sequence is mutated once, and
//! the file is rewritten from the complete new content. A failure at any
//! point before the final write leaves the on-disk document untouched.

use std::fs;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use showboat_exec::{Capture, RunOptions, copy_image, run};
use showboat_markdown::{
    Block, CodeBlock, CommentaryBlock, ImageOutputBlock, OutputBlock, TitleBlock,
    parse_image_reference, render,
};

use crate::error::OpsError;
use crate::remote;

/// Parses the document at `path` into its block sequence.
///
/// # Errors
///
/// Returns [`OpsError::Read`] when the file cannot be read and
/// [`OpsError::Parse`] when its contents are malformed.
pub fn read_blocks(path: &Path) -> Result<Vec<Block>, OpsError> {
    let text = fs::read_to_string(path).map_err(|source| OpsError::read(path, source))?;
    showboat_markdown::parse(&text).map_err(|source| OpsError::parse(path, source))
}

/// Renders `blocks` and replaces the file at `path` with the result.
pub(crate) fn write_blocks(path: &Path, blocks: &[Block]) -> Result<(), OpsError> {
    let text = render(blocks);
    fs::write(path, text).map_err(|source| OpsError::write(path, source))
}

/// The `showboat-id` of the document, when its title carries one.
pub(crate) fn document_id(blocks: &[Block]) -> &str {
    match blocks.first() {
        Some(Block::Title(title)) => title.document_id.as_deref().unwrap_or_default(),
        _ => "",
    }
}

fn require_document(path: &Path) -> Result<(), OpsError> {
    if path.exists() {
        Ok(())
    } else {
        Err(OpsError::NotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Creates a new document with a title block and nothing else.
///
/// The title records the current UTC time, the given tool version, and a
/// fresh document identifier used to correlate remote notifications.
///
/// # Errors
///
/// Returns [`OpsError::AlreadyExists`] when `path` already exists, plus the
/// usual write failures.
pub fn init(path: &Path, title: &str, version: Option<&str>) -> Result<(), OpsError> {
    if path.exists() {
        return Err(OpsError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }

    let timestamp = OffsetDateTime::now_utc().format(&Rfc3339)?;
    let id = Uuid::new_v4().to_string();
    let blocks = vec![Block::Title(TitleBlock {
        title: title.to_owned(),
        timestamp,
        version: version.map(str::to_owned),
        document_id: Some(id.clone()),
    })];
    write_blocks(path, &blocks)?;

    remote::notify_init(&id, title);
    Ok(())
}

/// Appends a commentary block.
///
/// # Errors
///
/// Returns the usual read/parse/write failures.
pub fn note(path: &Path, text: &str) -> Result<(), OpsError> {
    let mut blocks = read_blocks(path)?;
    let commentary = Block::Commentary(CommentaryBlock {
        text: text.to_owned(),
    });
    blocks.push(commentary.clone());
    write_blocks(path, &blocks)?;

    remote::notify_note(document_id(&blocks), &[commentary]);
    Ok(())
}

/// Runs code and appends the code block plus its captured output.
///
/// The code is executed before the document is touched, so an interpreter
/// that fails to launch leaves the file unchanged. The capture is recorded
/// whatever the exit code (non-zero exit is data) and returned so the
/// caller can pass the exit code through.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] when the document is missing, exec errors
/// when the interpreter or filter cannot be run, and read/parse/write
/// failures.
pub fn exec(
    path: &Path,
    language: &str,
    code: &str,
    filter: Option<&str>,
    workdir: Option<&Path>,
) -> Result<Capture, OpsError> {
    require_document(path)?;

    let options = RunOptions {
        workdir: workdir.map(Path::to_path_buf),
        port: None,
        filter: filter.map(str::to_owned),
    };
    let capture = run(language, code, &options)?;

    let mut blocks = read_blocks(path)?;
    let code_block = CodeBlock {
        language: language.to_owned(),
        code: code.to_owned(),
        is_image: false,
        is_server: false,
        filter: filter.map(str::to_owned),
    };
    let output_block = OutputBlock::new(capture.output.clone());
    blocks.push(Block::Code(code_block.clone()));
    blocks.push(Block::Output(output_block.clone()));
    write_blocks(path, &blocks)?;

    remote::notify_exec(document_id(&blocks), &code_block, &output_block);
    Ok(capture)
}

/// Copies an image next to the document and appends its reference.
///
/// `argument` is either a plain path or a markdown `![alt](path)` reference;
/// the latter supplies the alt text. The image is copied into the document's
/// directory under a generated name, and only that relative filename is
/// embedded. Returns the generated filename.
///
/// Only the image reference block is appended: no `{image}` code block is
/// fabricated, so the code/output adjacency convention does not hold for
/// references added through this path.
///
/// # Errors
///
/// Returns [`OpsError::NotFound`] when the document is missing, image
/// validation/copy errors, and read/parse/write failures.
pub fn image(path: &Path, argument: &str) -> Result<String, OpsError> {
    require_document(path)?;

    let (alt, source) = match parse_image_reference(argument) {
        Some((alt, filename)) => (alt, PathBuf::from(filename)),
        None => (String::new(), PathBuf::from(argument)),
    };
    let dest_dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let dest_dir = dest_dir.unwrap_or_else(|| Path::new("."));
    let filename = copy_image(&source, dest_dir)?;

    let alt_text = if alt.is_empty() {
        filename
            .rsplit_once('.')
            .map_or(filename.as_str(), |(stem, _)| stem)
            .to_owned()
    } else {
        alt
    };

    let mut blocks = read_blocks(path)?;
    blocks.push(Block::ImageOutput(ImageOutputBlock {
        alt_text: alt_text.clone(),
        filename: filename.clone(),
    }));
    write_blocks(path, &blocks)?;

    remote::notify_image(
        document_id(&blocks),
        &alt_text,
        &filename,
        &dest_dir.join(&filename),
    );
    Ok(filename)
}

/// Removes the most recent entry.
///
/// A trailing output (text or image) removes its generating code block as a
/// unit when the preceding block really is a code block; the adjacency
/// convention is validated here rather than assumed. Anything else removes a
/// single block. The title alone cannot be popped.
///
/// # Errors
///
/// Returns [`OpsError::EmptyDocument`] or [`OpsError::OnlyTitle`] when there
/// is nothing to remove, plus read/parse/write failures.
pub fn pop(path: &Path) -> Result<(), OpsError> {
    let mut blocks = read_blocks(path)?;

    let Some(last) = blocks.last() else {
        return Err(OpsError::EmptyDocument);
    };
    if blocks.len() == 1 && matches!(last, Block::Title(_)) {
        return Err(OpsError::OnlyTitle);
    }

    let remove = match last {
        Block::Output(_) | Block::ImageOutput(_) => {
            let paired = blocks.len() >= 2
                && matches!(blocks.get(blocks.len() - 2), Some(Block::Code(_)));
            if paired { 2 } else { 1 }
        }
        _ => 1,
    };
    blocks.truncate(blocks.len() - remove);
    write_blocks(path, &blocks)?;

    remote::notify_pop(document_id(&blocks));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_doc() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("demo.md");
        (dir, path)
    }

    #[test]
    fn init_writes_title_with_id_and_version() {
        let (_dir, path) = temp_doc();
        init(&path, "My Demo", Some("v0.1.0")).expect("init");

        let blocks = read_blocks(&path).expect("read");
        assert_eq!(blocks.len(), 1);
        let Some(Block::Title(title)) = blocks.first() else {
            panic!("expected title block");
        };
        assert_eq!(title.title, "My Demo");
        assert_eq!(title.version.as_deref(), Some("v0.1.0"));
        assert!(!title.timestamp.is_empty());
        assert!(title.document_id.is_some());
    }

    #[test]
    fn init_refuses_existing_file() {
        let (_dir, path) = temp_doc();
        fs::write(&path, "already here").expect("write");
        let result = init(&path, "Demo", None);
        assert!(matches!(result, Err(OpsError::AlreadyExists { .. })));
        assert_eq!(fs::read_to_string(&path).expect("read"), "already here");
    }

    #[test]
    fn note_appends_commentary() {
        let (_dir, path) = temp_doc();
        init(&path, "Demo", None).expect("init");
        note(&path, "Hello world.").expect("note");

        let blocks = read_blocks(&path).expect("read");
        assert_eq!(blocks.len(), 2);
        let Some(Block::Commentary(commentary)) = blocks.get(1) else {
            panic!("expected commentary block");
        };
        assert_eq!(commentary.text, "Hello world.");
    }

    #[test]
    fn exec_records_code_and_output() {
        let (_dir, path) = temp_doc();
        init(&path, "Demo", None).expect("init");
        let capture = exec(&path, "bash", "echo hello", None, None).expect("exec");
        assert_eq!(capture.output, "hello\n");
        assert_eq!(capture.exit_code, 0);

        let blocks = read_blocks(&path).expect("read");
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks.get(1), Some(Block::Code(_))));
        let Some(Block::Output(output)) = blocks.get(2) else {
            panic!("expected output block");
        };
        assert_eq!(output.content, "hello\n");
    }

    #[test]
    fn exec_records_failing_output_and_reports_exit_code() {
        let (_dir, path) = temp_doc();
        init(&path, "Demo", None).expect("init");
        let capture =
            exec(&path, "bash", "echo fail output && exit 42", None, None).expect("exec");
        assert_eq!(capture.output, "fail output\n");
        assert_eq!(capture.exit_code, 42);

        let text = fs::read_to_string(&path).expect("read");
        assert!(text.contains("fail output"));
    }

    #[test]
    fn exec_with_filter_records_filtered_output_and_annotation() {
        let (_dir, path) = temp_doc();
        init(&path, "Demo", None).expect("init");
        let capture = exec(&path, "bash", "echo hello", Some("tr a-z A-Z"), None).expect("exec");
        assert_eq!(capture.output, "HELLO\n");

        let blocks = read_blocks(&path).expect("read");
        let Some(Block::Code(code)) = blocks.get(1) else {
            panic!("expected code block");
        };
        assert_eq!(code.filter.as_deref(), Some("tr a-z A-Z"));
        let Some(Block::Output(output)) = blocks.get(2) else {
            panic!("expected output block");
        };
        assert_eq!(output.content, "HELLO\n");
    }

    #[test]
    fn exec_launch_failure_leaves_document_untouched() {
        let (_dir, path) = temp_doc();
        init(&path, "Demo", None).expect("init");
        let before = fs::read_to_string(&path).expect("read");

        let result = exec(&path, "showboat-no-such-interpreter", "true", None, None);
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).expect("read"), before);
    }

    #[test]
    fn exec_requires_existing_document() {
        let (_dir, path) = temp_doc();
        let result = exec(&path, "bash", "echo hi", None, None);
        assert!(matches!(result, Err(OpsError::NotFound { .. })));
    }

    #[test]
    fn image_copies_and_appends_reference() {
        let (dir, path) = temp_doc();
        init(&path, "Demo", None).expect("init");
        let src = dir.path().join("shot.png");
        fs::write(&src, b"png bytes").expect("write image");

        let filename = image(&path, &src.to_string_lossy()).expect("image");
        assert!(filename.ends_with(".png"));
        assert!(path.parent().expect("parent").join(&filename).exists());

        let blocks = read_blocks(&path).expect("read");
        // The reference stands alone: no code block is fabricated for it.
        assert_eq!(blocks.len(), 2);
        let Some(Block::ImageOutput(reference)) = blocks.get(1) else {
            panic!("expected image output block");
        };
        assert_eq!(reference.filename, filename);
    }

    #[test]
    fn image_accepts_markdown_reference_with_alt_text() {
        let (dir, path) = temp_doc();
        init(&path, "Demo", None).expect("init");
        let src = dir.path().join("shot.png");
        fs::write(&src, b"png bytes").expect("write image");

        let argument = format!("![The dashboard]({})", src.to_string_lossy());
        image(&path, &argument).expect("image");

        let blocks = read_blocks(&path).expect("read");
        let Some(Block::ImageOutput(reference)) = blocks.get(1) else {
            panic!("expected image output block");
        };
        assert_eq!(reference.alt_text, "The dashboard");
    }

    #[test]
    fn pop_removes_trailing_commentary() {
        let (_dir, path) = temp_doc();
        init(&path, "Demo", None).expect("init");
        note(&path, "First.").expect("note");
        exec(&path, "bash", "echo hello", None, None).expect("exec");
        note(&path, "Second.").expect("note");

        pop(&path).expect("pop");
        let text = fs::read_to_string(&path).expect("read");
        assert!(text.contains("First."));
        assert!(text.contains("echo hello"));
        assert!(!text.contains("Second."));
    }

    #[test]
    fn pop_treats_adjacent_notes_as_one_merged_block() {
        // Prose separated only by blank lines reparses as a single
        // commentary block, so popping removes the merged chunk.
        let (_dir, path) = temp_doc();
        init(&path, "Demo", None).expect("init");
        note(&path, "First.").expect("note");
        note(&path, "Second.").expect("note");

        pop(&path).expect("pop");
        let text = fs::read_to_string(&path).expect("read");
        assert!(!text.contains("First."));
        assert!(!text.contains("Second."));
    }

    #[test]
    fn pop_removes_exec_entry_as_a_unit() {
        let (_dir, path) = temp_doc();
        init(&path, "Demo", None).expect("init");
        note(&path, "Keep me.").expect("note");
        exec(&path, "bash", "echo hello", None, None).expect("exec");

        pop(&path).expect("pop");
        let blocks = read_blocks(&path).expect("read");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks.get(1), Some(Block::Commentary(_))));
    }

    #[test]
    fn pop_removes_unpaired_image_reference_alone() {
        let (dir, path) = temp_doc();
        init(&path, "Demo", None).expect("init");
        note(&path, "Keep me.").expect("note");
        let src = dir.path().join("shot.png");
        fs::write(&src, b"png bytes").expect("write image");
        image(&path, &src.to_string_lossy()).expect("image");

        pop(&path).expect("pop");
        let blocks = read_blocks(&path).expect("read");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks.get(1), Some(Block::Commentary(_))));
    }

    #[test]
    fn pop_rejects_title_only_document() {
        let (_dir, path) = temp_doc();
        init(&path, "Demo", None).expect("init");
        let result = pop(&path);
        assert!(matches!(result, Err(OpsError::OnlyTitle)));
    }

    #[test]
    fn pop_rejects_empty_document() {
        let (_dir, path) = temp_doc();
        fs::write(&path, "").expect("write");
        let result = pop(&path);
        assert!(matches!(result, Err(OpsError::EmptyDocument)));
    }
}

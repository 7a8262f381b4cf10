//! Optional notification of a remote collector.
//!
//! When `SHOWBOAT_REMOTE_URL` is set, mutating operations POST a
//! representation of the blocks they appended. Notification is strictly
//! best-effort: transport failures and error statuses are logged as
//! warnings and never fail the primary operation.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::warn;
use uuid::Uuid;

use showboat_markdown::{Block, CodeBlock, OutputBlock, render};

/// Environment variable naming the remote collector endpoint.
pub const REMOTE_URL_ENV: &str = "SHOWBOAT_REMOTE_URL";

const REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

fn remote_url() -> Option<String> {
    env::var(REMOTE_URL_ENV).ok().filter(|url| !url.is_empty())
}

fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(REMOTE_TIMEOUT).build()
}

fn post_form(url: &str, fields: &[(&str, &str)]) {
    match agent().post(url).send_form(fields) {
        Ok(_) => {}
        Err(error) => warn!(%error, "remote POST failed"),
    }
}

/// Notifies the collector that a document was created.
pub fn notify_init(document_id: &str, title: &str) {
    let Some(url) = remote_url() else { return };
    post_form(
        &url,
        &[("uuid", document_id), ("command", "init"), ("title", title)],
    );
}

/// Notifies the collector of appended commentary, rendered as markdown.
pub fn notify_note(document_id: &str, blocks: &[Block]) {
    let Some(url) = remote_url() else { return };
    let markdown = render(blocks);
    post_form(
        &url,
        &[
            ("uuid", document_id),
            ("command", "note"),
            ("markdown", &markdown),
        ],
    );
}

/// Notifies the collector of an executed code block and its output.
pub fn notify_exec(document_id: &str, code: &CodeBlock, output: &OutputBlock) {
    let Some(url) = remote_url() else { return };
    post_form(
        &url,
        &[
            ("uuid", document_id),
            ("command", "exec"),
            ("language", &code.language),
            ("input", &code.code),
            ("output", &output.content),
        ],
    );
}

/// Notifies the collector that the most recent entry was removed.
pub fn notify_pop(document_id: &str) {
    let Some(url) = remote_url() else { return };
    post_form(&url, &[("uuid", document_id), ("command", "pop")]);
}

/// Uploads a captured image to the collector as multipart form data.
pub fn notify_image(document_id: &str, alt_text: &str, filename: &str, image_path: &Path) {
    let Some(url) = remote_url() else { return };

    let bytes = match fs::read(image_path) {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(%error, path = %image_path.display(), "remote POST skipped: unreadable image");
            return;
        }
    };

    let boundary = format!("showboat-{}", Uuid::new_v4().simple());
    let body = multipart_body(
        &boundary,
        &[
            ("uuid", document_id),
            ("command", "image"),
            ("filename", filename),
            ("alt", alt_text),
        ],
        filename,
        &bytes,
    );

    let content_type = format!("multipart/form-data; boundary={boundary}");
    match agent()
        .post(&url)
        .set("Content-Type", &content_type)
        .send_bytes(&body)
    {
        Ok(_) => {}
        Err(error) => warn!(%error, "remote POST failed"),
    }
}

/// Assembles a multipart/form-data body: text fields first, then the image
/// under the `image` field name.
fn multipart_body(
    boundary: &str,
    fields: &[(&str, &str)],
    filename: &str,
    image: &[u8],
) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(image);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipart_body_has_all_parts_and_terminator() {
        let body = multipart_body(
            "boundary123",
            &[("uuid", "abc"), ("command", "image")],
            "shot.png",
            b"png bytes",
        );
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("--boundary123\r\n"));
        assert!(text.contains("name=\"uuid\"\r\n\r\nabc\r\n"));
        assert!(text.contains("name=\"command\"\r\n\r\nimage\r\n"));
        assert!(text.contains("name=\"image\"; filename=\"shot.png\""));
        assert!(text.contains("png bytes"));
        assert!(text.ends_with("--boundary123--\r\n"));
    }

    #[test]
    fn missing_env_var_means_no_remote() {
        // The variable is absent in the test environment, so this must be a
        // quiet no-op rather than a network attempt.
        if env::var(REMOTE_URL_ENV).is_err() {
            notify_pop("abc");
        }
    }
}

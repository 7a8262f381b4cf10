//! Image capture: validation and copying next to the document.

use std::fs;
use std::path::Path;

use time::OffsetDateTime;
use time::macros::format_description;
use uuid::Uuid;

use crate::error::ExecError;

/// Recognised image file extensions, lowercased.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp"];

/// Copies an image into `dest_dir` under a generated
/// `<uuid8>-<date>.<ext>` filename and returns that filename.
///
/// The document only ever embeds the relative filename, so the image must
/// live alongside the document file; this is the copy that puts it there.
///
/// # Errors
///
/// Returns [`ExecError::ImageNotFound`] when `src` is missing or not a
/// regular file, [`ExecError::UnrecognizedImageFormat`] for an extension
/// outside the recognised set, and [`ExecError::ImageCopy`] when the copy
/// itself fails.
pub fn copy_image(src: &Path, dest_dir: &Path) -> Result<String, ExecError> {
    let metadata = fs::metadata(src).map_err(|_| ExecError::ImageNotFound {
        path: src.to_path_buf(),
    })?;
    if !metadata.is_file() {
        return Err(ExecError::ImageNotFound {
            path: src.to_path_buf(),
        });
    }

    let extension = src
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ExecError::UnrecognizedImageFormat { extension });
    }

    let filename = generated_filename(&extension);
    let dest = dest_dir.join(&filename);
    fs::copy(src, &dest).map_err(|source| ExecError::ImageCopy {
        path: dest.clone(),
        source,
    })?;

    Ok(filename)
}

/// Builds `<uuid8>-<date>.<ext>`: eight hex characters of a fresh UUID plus
/// the current UTC date.
fn generated_filename(extension: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    let prefix = id.get(..8).unwrap_or(&id);
    let date = OffsetDateTime::now_utc()
        .date()
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default();
    format!("{prefix}-{date}.{extension}")
}

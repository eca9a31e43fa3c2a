//! Shared test-only helpers for pacboard_core.

use crate::form::UploadForm;
use crate::Library;
use tempfile::TempDir;

/// Opens a library rooted in a fresh temporary directory.
///
/// Keep the [`TempDir`] alive for the full test to preserve the backing files.
///
/// # Panics
/// Panics if temp-dir creation or library initialization fails.
pub(crate) fn setup_temp_library() -> (Library, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let library = Library::open(temp_dir.path()).expect("library");
    (library, temp_dir)
}

/// Minimal bytes standing in for a PNG upload.
pub(crate) fn png() -> Vec<u8> {
    b"\x89PNG\r\n\x1a\nfake-image".to_vec()
}

/// An issue upload form with the required fields and a `cover.png` cover.
pub(crate) fn issue_form(number: &str, title: &str) -> UploadForm {
    UploadForm::new()
        .with_text("issue_number", number)
        .with_text("title", title)
        .with_file("cover_image", "cover.png", &png())
}

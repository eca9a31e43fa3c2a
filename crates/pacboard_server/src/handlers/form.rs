//! Multipart body collection.

use crate::error::HttpError;
use axum::extract::Multipart;
use pacboard_core::form::{UploadForm, UploadedFile};

/// Drain a multipart body into an [`UploadForm`].
///
/// Parts with a file name become files (even when the name is empty, which
/// [`UploadForm::file`] then ignores); all other named parts are text.
/// Unnamed parts are skipped.
///
/// # Errors
/// Returns the multipart error's status (400, or 413 past the body limit).
pub(crate) async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, HttpError> {
    let mut form = UploadForm::new();
    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field.bytes().await?;
                form.push_file(name, UploadedFile::new(file_name, bytes.to_vec()));
            }
            None => {
                let value = field.text().await?;
                form.push_text(name, value);
            }
        }
    }
    Ok(form)
}

//! Multipart form contents collected into an owned, lookup-friendly shape.
//!
//! The HTTP layer streams parts into an [`UploadForm`]; intake then reads it
//! by field name the same way regardless of transport.

use std::collections::HashMap;

/// A file part of a submitted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-supplied file name (may be empty when the input was left blank).
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Text fields and file parts of one submitted form.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    texts: HashMap<String, Vec<String>>,
    files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text value; repeated names (`existing_photos[]`) keep every value.
    pub fn push_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.texts.entry(name.into()).or_default().push(value.into());
    }

    /// Record a file part. The first part wins when a name repeats.
    pub fn push_file(&mut self, name: impl Into<String>, file: UploadedFile) {
        self.files.entry(name.into()).or_insert(file);
    }

    /// Builder-style [`Self::push_text`], mostly for tests.
    pub fn with_text(mut self, name: &str, value: &str) -> Self {
        self.push_text(name, value);
        self
    }

    /// Builder-style [`Self::push_file`], mostly for tests.
    pub fn with_file(mut self, name: &str, file_name: &str, bytes: &[u8]) -> Self {
        self.push_file(name, UploadedFile::new(file_name, bytes));
        self
    }

    /// First value of a text field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value submitted under `name`, in arrival order.
    pub fn texts(&self, name: &str) -> &[String] {
        self.texts.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_text(&self, name: &str) -> bool {
        self.texts.contains_key(name)
    }

    /// A file part that actually carries an upload.
    ///
    /// Browsers submit blank file inputs as parts with an empty file name;
    /// those count as "no upload".
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files
            .get(name)
            .filter(|file| !file.file_name.trim().is_empty())
    }

    /// Whether the client flagged this submission as an edit of an existing record.
    pub fn is_edit(&self) -> bool {
        self.text("is_edit") == Some("true")
    }
}

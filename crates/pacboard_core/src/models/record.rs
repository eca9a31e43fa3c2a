//! Record types persisted in the per-category directory files.

use super::category::Category;
use crate::form::UploadForm;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One ordered text block of an issue, event, or reading-circle entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Validated, category-neutral pieces of an upload.
///
/// Built by [`crate::intake`] once every field and file has been accepted;
/// [`Entry::from_submission`] turns it into the concrete record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub number: String,
    pub title: String,
    pub date: String,
    pub upload_date: String,
    pub cover_image: Option<String>,
    pub sections: Vec<Section>,
    pub photos: Vec<String>,
}

/// A record stored in one category directory.
pub trait Entry: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Category whose directory holds this record type.
    const CATEGORY: Category;

    /// Display form of the record number.
    fn number(&self) -> &str;

    fn upload_date(&self) -> &str;

    fn set_upload_date(&mut self, upload_date: String);

    fn cover_image(&self) -> Option<&str>;

    /// Every stored image reference, cover first, in display order.
    fn image_refs(&self) -> Vec<&str>;

    /// Assemble the record from an accepted submission.
    ///
    /// `form` supplies category-specific free-text fields.
    fn from_submission(submission: Submission, form: &UploadForm) -> Self;
}

fn section_image_refs<'a>(cover: Option<&'a str>, sections: &'a [Section]) -> Vec<&'a str> {
    cover
        .into_iter()
        .chain(sections.iter().filter_map(|section| section.image.as_deref()))
        .collect()
}

fn optional_text(form: &UploadForm, name: &str) -> String {
    form.text(name).unwrap_or_default().to_string()
}

/// A PAC Times magazine issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub issue_number: String,
    pub title: String,
    #[serde(default)]
    pub issue_date: String,
    #[serde(default)]
    pub upload_date: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Entry for Issue {
    const CATEGORY: Category = Category::PacTimes;

    fn number(&self) -> &str {
        &self.issue_number
    }

    fn upload_date(&self) -> &str {
        &self.upload_date
    }

    fn set_upload_date(&mut self, upload_date: String) {
        self.upload_date = upload_date;
    }

    fn cover_image(&self) -> Option<&str> {
        self.cover_image.as_deref()
    }

    fn image_refs(&self) -> Vec<&str> {
        section_image_refs(self.cover_image.as_deref(), &self.sections)
    }

    fn from_submission(submission: Submission, _form: &UploadForm) -> Self {
        Self {
            issue_number: submission.number,
            title: submission.title,
            issue_date: submission.date,
            upload_date: submission.upload_date,
            cover_image: submission.cover_image,
            sections: submission.sections,
        }
    }
}

/// A club event. The flat `heading`/`body` fields predate sections and are
/// still sent by the events admin form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_number: String,
    pub title: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default)]
    pub upload_date: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub heading: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub image_gallery_album_id: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Entry for Event {
    const CATEGORY: Category = Category::PacEvents;

    fn number(&self) -> &str {
        &self.event_number
    }

    fn upload_date(&self) -> &str {
        &self.upload_date
    }

    fn set_upload_date(&mut self, upload_date: String) {
        self.upload_date = upload_date;
    }

    fn cover_image(&self) -> Option<&str> {
        self.cover_image.as_deref()
    }

    fn image_refs(&self) -> Vec<&str> {
        section_image_refs(self.cover_image.as_deref(), &self.sections)
    }

    fn from_submission(submission: Submission, form: &UploadForm) -> Self {
        Self {
            event_number: submission.number,
            title: submission.title,
            event_date: submission.date,
            upload_date: submission.upload_date,
            cover_image: submission.cover_image,
            heading: optional_text(form, "heading"),
            body: optional_text(form, "body"),
            image_gallery_album_id: optional_text(form, "image_gallery_album_id"),
            sections: submission.sections,
        }
    }
}

/// A reading-circle session write-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingCircleEntry {
    pub event_number: String,
    pub title: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default)]
    pub upload_date: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Entry for ReadingCircleEntry {
    const CATEGORY: Category = Category::ReadingCircle;

    fn number(&self) -> &str {
        &self.event_number
    }

    fn upload_date(&self) -> &str {
        &self.upload_date
    }

    fn set_upload_date(&mut self, upload_date: String) {
        self.upload_date = upload_date;
    }

    fn cover_image(&self) -> Option<&str> {
        self.cover_image.as_deref()
    }

    fn image_refs(&self) -> Vec<&str> {
        section_image_refs(self.cover_image.as_deref(), &self.sections)
    }

    fn from_submission(submission: Submission, _form: &UploadForm) -> Self {
        Self {
            event_number: submission.number,
            title: submission.title,
            event_date: submission.date,
            upload_date: submission.upload_date,
            cover_image: submission.cover_image,
            sections: submission.sections,
        }
    }
}

/// A photo gallery album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub album_number: String,
    pub title: String,
    #[serde(default)]
    pub album_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub upload_date: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl Entry for Album {
    const CATEGORY: Category = Category::PhotoAlbums;

    fn number(&self) -> &str {
        &self.album_number
    }

    fn upload_date(&self) -> &str {
        &self.upload_date
    }

    fn set_upload_date(&mut self, upload_date: String) {
        self.upload_date = upload_date;
    }

    fn cover_image(&self) -> Option<&str> {
        self.cover_image.as_deref()
    }

    fn image_refs(&self) -> Vec<&str> {
        self.cover_image
            .as_deref()
            .into_iter()
            .chain(self.photos.iter().map(String::as_str))
            .collect()
    }

    fn from_submission(submission: Submission, form: &UploadForm) -> Self {
        Self {
            album_number: submission.number,
            title: submission.title,
            album_date: submission.date,
            description: optional_text(form, "description"),
            upload_date: submission.upload_date,
            cover_image: submission.cover_image,
            photos: submission.photos,
        }
    }
}

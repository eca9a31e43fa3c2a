//! Upload validation: required fields, cover/section/photo images, and
//! assembly of the record to upsert.
//!
//! Planning never touches the filesystem. A request is either rejected here
//! with [`AppError::BadRequest`] or yields an [`UploadPlan`] whose pending
//! images are all acceptable.

use crate::constants::ALLOWED_IMAGE_EXTENSIONS;
use crate::error::AppError;
use crate::form::{UploadForm, UploadedFile};
use crate::images::{is_allowed_image, sanitize_file_name, ImageStore, PendingImage};
use crate::models::{number_key, BodyLayout, Entry, Section, Submission};

/// Form field holding the cover upload.
pub const COVER_FIELD: &str = "cover_image";
/// Form field holding the kept album photos in edit mode.
pub const EXISTING_PHOTOS_FIELD: &str = "existing_photos[]";

/// Per-file limits applied to accepted uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_file_size: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: crate::constants::DEFAULT_MAX_FILE_SIZE,
        }
    }
}

/// The required identity of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFields {
    /// Trimmed display number.
    pub number: String,
    /// Integer key used for matching and ordering.
    pub key: u64,
    pub title: String,
}

impl RequiredFields {
    /// Read the number and title fields for record type `E`.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] when either field is missing or the
    /// number is not a non-negative integer.
    pub fn from_form<E: Entry>(form: &UploadForm) -> Result<Self, AppError> {
        let number_field = E::CATEGORY.number_field();
        let (Some(number), Some(title)) = (form.text(number_field), form.text("title")) else {
            return Err(AppError::BadRequest("Missing required fields".to_string()));
        };
        let key = number_key(number).ok_or_else(|| invalid_number(number_field, number))?;
        Ok(Self {
            number: number.trim().to_string(),
            key,
            title: title.to_string(),
        })
    }
}

/// Error for a number that is not a non-negative integer.
pub fn invalid_number(field: &str, raw: &str) -> AppError {
    AppError::BadRequest(format!(
        "Invalid {}: '{}' is not a non-negative integer",
        field, raw
    ))
}

/// An accepted upload: the record to store plus the images to write first.
#[derive(Debug)]
pub struct UploadPlan<'a, E> {
    pub entry: E,
    pub pending: Vec<PendingImage<'a>>,
}

struct Planner<'a, 's> {
    form: &'a UploadForm,
    images: &'s ImageStore,
    limits: UploadLimits,
    name_stem: String,
    /// References held by the stored record; the only ones a submission may keep.
    stored_refs: Vec<String>,
    pending: Vec<PendingImage<'a>>,
}

impl<'a> Planner<'a, '_> {
    /// Validate one upload and queue it under `{prefix}_{number}_{role}_{original}`.
    fn accept(&mut self, file: &'a UploadedFile, role: &str) -> Result<String, AppError> {
        if !is_allowed_image(&file.file_name) {
            return Err(AppError::BadRequest(format!(
                "Invalid file type. Allowed types: {}",
                ALLOWED_IMAGE_EXTENSIONS.join(", ")
            )));
        }
        if file.bytes.len() > self.limits.max_file_size {
            return Err(AppError::BadRequest(format!(
                "File '{}' exceeds maximum size of {} bytes",
                file.file_name, self.limits.max_file_size
            )));
        }
        let mut stored_name =
            sanitize_file_name(&format!("{}_{}_{}", self.name_stem, role, file.file_name));
        if self.is_taken(&stored_name) {
            let tag = uuid::Uuid::new_v4().simple().to_string();
            stored_name = sanitize_file_name(&format!(
                "{}_{}_{}_{}",
                self.name_stem,
                role,
                &tag[..8],
                file.file_name
            ));
        }
        let path_ref = self.images.path_ref(&stored_name);
        self.pending.push(PendingImage {
            stored_name,
            bytes: &file.bytes,
        });
        Ok(path_ref)
    }

    /// Whether `stored_name` would overwrite a stored or already queued image.
    fn is_taken(&self, stored_name: &str) -> bool {
        let path_ref = self.images.path_ref(stored_name);
        self.stored_refs.contains(&path_ref)
            || self
                .pending
                .iter()
                .any(|image| image.stored_name == stored_name)
    }

    /// Keep a client-supplied reference only when the stored record already holds it.
    fn keep_existing(&self, path_ref: &str) -> Option<String> {
        let trimmed = path_ref.trim();
        if trimmed.is_empty() {
            return None;
        }
        if self.stored_refs.iter().any(|stored| stored == trimmed) {
            Some(trimmed.to_string())
        } else {
            tracing::warn!(
                "Dropping kept image reference '{}' not held by {}",
                trimmed,
                self.name_stem
            );
            None
        }
    }

    fn sections(&mut self) -> Result<Vec<Section>, AppError> {
        let form = self.form;
        let is_edit = form.is_edit();
        let mut sections = Vec::new();
        for index in 0.. {
            let Some(heading) = form.text(&format!("section_{index}_heading")) else {
                break;
            };
            let body = form
                .text(&format!("section_{index}_body"))
                .unwrap_or_default()
                .to_string();
            let image = match form.file(&format!("section_{index}_image")) {
                Some(file) => Some(self.accept(file, &format!("section_{index}"))?),
                None if is_edit => form
                    .text(&format!("section_{index}_existing_image"))
                    .and_then(|existing| self.keep_existing(existing)),
                None => None,
            };
            sections.push(Section {
                heading: heading.to_string(),
                body,
                image,
            });
        }
        Ok(sections)
    }

    fn photos(&mut self) -> Result<Vec<String>, AppError> {
        let form = self.form;
        let mut photos: Vec<String> = Vec::new();
        if form.is_edit() {
            for existing in form.texts(EXISTING_PHOTOS_FIELD) {
                if let Some(kept) = self.keep_existing(existing) {
                    if !photos.contains(&kept) {
                        photos.push(kept);
                    }
                }
            }
        }
        for index in 0.. {
            let Some(file) = form.file(&format!("photo_{index}")) else {
                break;
            };
            let path_ref = self.accept(file, &format!("photo_{index}"))?;
            photos.push(path_ref);
        }
        Ok(photos)
    }
}

/// Validate a submission for record type `E` and assemble the record.
///
/// Kept references must already belong to `existing`. A new upload whose
/// stored name matches a stored or queued image gets a random tag.
///
/// # Arguments
/// - `form`: Submitted fields and files.
/// - `required`: Number and title already read from `form`.
/// - `existing`: Stored record with the same number, if any.
/// - `images`: Image folder of the category (used for naming only).
/// - `limits`: Per-file limits.
/// - `upload_date`: Timestamp for a newly created record.
///
/// # Returns
/// The record and the images that must be written before it is stored.
///
/// # Errors
/// Returns [`AppError::BadRequest`] for a disallowed or oversized image, or
/// a missing cover outside edit mode.
pub fn plan_upload<'a, E: Entry>(
    form: &'a UploadForm,
    required: RequiredFields,
    existing: Option<&E>,
    images: &ImageStore,
    limits: UploadLimits,
    upload_date: String,
) -> Result<UploadPlan<'a, E>, AppError> {
    let category = E::CATEGORY;
    let mut planner = Planner {
        form,
        images,
        limits,
        name_stem: format!("{}_{}", category.file_prefix(), required.number),
        stored_refs: existing
            .map(|entry| entry.image_refs().into_iter().map(str::to_string).collect())
            .unwrap_or_default(),
        pending: Vec::new(),
    };

    let cover_image = match form.file(COVER_FIELD) {
        Some(file) => Some(planner.accept(file, "cover")?),
        None if form.is_edit() => {
            if existing.is_none() {
                tracing::debug!(
                    "Edit of unknown {} {}; storing without cover",
                    category,
                    required.number
                );
            }
            existing.and_then(|entry| entry.cover_image().map(str::to_string))
        }
        None => return Err(AppError::BadRequest("No cover image provided".to_string())),
    };

    let (sections, photos) = match category.layout() {
        BodyLayout::Sections => (planner.sections()?, Vec::new()),
        BodyLayout::Photos => (Vec::new(), planner.photos()?),
    };

    let submission = Submission {
        number: required.number,
        title: required.title,
        date: form
            .text(category.date_field())
            .unwrap_or_default()
            .to_string(),
        upload_date,
        cover_image,
        sections,
        photos,
    };

    Ok(UploadPlan {
        entry: E::from_submission(submission, form),
        pending: planner.pending,
    })
}

/// Image references of `previous` that `current` no longer uses.
pub fn orphaned_refs<E: Entry>(previous: &E, current: &E) -> Vec<String> {
    let still_used = current.image_refs();
    previous
        .image_refs()
        .into_iter()
        .filter(|path_ref| !still_used.contains(path_ref))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Album, Event, Issue};
    use crate::test_support::{issue_form, png};
    use std::path::Path;

    fn store_for<E: Entry>() -> ImageStore {
        ImageStore::new(Path::new("/srv/static"), E::CATEGORY)
    }

    fn plan<'a, E: Entry>(
        form: &'a UploadForm,
        existing: Option<&E>,
    ) -> Result<UploadPlan<'a, E>, AppError> {
        let required = RequiredFields::from_form::<E>(form)?;
        plan_upload(
            form,
            required,
            existing,
            &store_for::<E>(),
            UploadLimits::default(),
            "2024-05-01 10:00:00".to_string(),
        )
    }

    #[test]
    fn required_fields_reject_missing_title_and_bad_numbers() {
        let missing = UploadForm::new().with_text("issue_number", "3");
        assert!(matches!(
            RequiredFields::from_form::<Issue>(&missing),
            Err(AppError::BadRequest(msg)) if msg == "Missing required fields"
        ));

        for raw in ["", "abc", "-1", "1.5"] {
            let form = UploadForm::new()
                .with_text("issue_number", raw)
                .with_text("title", "t");
            assert!(
                matches!(
                    RequiredFields::from_form::<Issue>(&form),
                    Err(AppError::BadRequest(_))
                ),
                "raw: {:?}",
                raw
            );
        }

        let form = UploadForm::new()
            .with_text("issue_number", " 012 ")
            .with_text("title", "Dark Matter");
        let required = RequiredFields::from_form::<Issue>(&form).expect("valid");
        assert_eq!(required.number, "012");
        assert_eq!(required.key, 12);
    }

    #[test]
    fn new_issue_requires_cover() {
        let form = UploadForm::new()
            .with_text("issue_number", "1")
            .with_text("title", "First");
        let err = plan::<Issue>(&form, None).expect_err("cover required");
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "No cover image provided"));
    }

    #[test]
    fn disallowed_cover_extension_is_rejected() {
        let form = UploadForm::new()
            .with_text("issue_number", "1")
            .with_text("title", "First")
            .with_file("cover_image", "photo.gif", b"gif");
        let err = plan::<Issue>(&form, None).expect_err("gif rejected");
        assert!(matches!(err, AppError::BadRequest(msg) if msg.starts_with("Invalid file type")));
    }

    #[test]
    fn oversized_image_is_rejected() {
        let form = issue_form("1", "First");
        let required = RequiredFields::from_form::<Issue>(&form).expect("fields");
        let err = plan_upload::<Issue>(
            &form,
            required,
            None,
            &store_for::<Issue>(),
            UploadLimits { max_file_size: 2 },
            String::new(),
        )
        .expect_err("too large");
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("exceeds maximum size")));
    }

    #[test]
    fn sections_stop_at_first_gap_and_name_images_by_index() {
        let form = issue_form("4", "Stars")
            .with_text("issue_date", "May 2024")
            .with_text("section_0_heading", "Intro")
            .with_text("section_0_body", "Hello")
            .with_file("section_0_image", "intro shot.PNG", &png())
            .with_text("section_1_heading", "No image")
            .with_text("section_3_heading", "Unreachable");

        let plan = plan::<Issue>(&form, None).expect("plan");
        let issue = plan.entry;
        assert_eq!(issue.issue_date, "May 2024");
        assert_eq!(issue.sections.len(), 2);
        assert_eq!(issue.sections[1].body, "");
        assert_eq!(
            issue.cover_image.as_deref(),
            Some("/static/pac_times/issue_4_cover_cover.png")
        );
        assert_eq!(
            issue.sections[0].image.as_deref(),
            Some("/static/pac_times/issue_4_section_0_intro_shot.PNG")
        );
        let names: Vec<&str> = plan
            .pending
            .iter()
            .map(|image| image.stored_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["issue_4_cover_cover.png", "issue_4_section_0_intro_shot.PNG"]
        );
    }

    #[test]
    fn disallowed_section_image_fails_the_whole_request() {
        let form = issue_form("4", "Stars")
            .with_text("section_0_heading", "Intro")
            .with_file("section_0_image", "anim.gif", b"gif");
        assert!(matches!(
            plan::<Issue>(&form, None),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn edit_keeps_only_images_the_stored_record_holds() {
        let stored = Issue {
            issue_number: "5".to_string(),
            title: "Old".to_string(),
            issue_date: String::new(),
            upload_date: "2024-01-01 00:00:00".to_string(),
            cover_image: Some("/static/pac_times/issue_5_cover_old.png".to_string()),
            sections: vec![Section {
                heading: "Kept".to_string(),
                body: String::new(),
                image: Some("/static/pac_times/issue_5_section_0_a.png".to_string()),
            }],
        };
        let form = UploadForm::new()
            .with_text("issue_number", "5")
            .with_text("title", "New")
            .with_text("is_edit", "true")
            .with_text("section_0_heading", "Kept")
            .with_text(
                "section_0_existing_image",
                "/static/pac_times/issue_5_section_0_a.png",
            )
            .with_text("section_1_heading", "Foreign")
            .with_text("section_1_existing_image", "/static/pac_events/x.png")
            .with_text("section_2_heading", "Other issue")
            .with_text(
                "section_2_existing_image",
                "/static/pac_times/issue_9_section_0_b.png",
            )
            .with_text("section_3_heading", "Missing file")
            .with_text("section_3_existing_image", "/static/pac_times/ghost.png");

        let plan = plan::<Issue>(&form, Some(&stored)).expect("plan");
        assert!(plan.pending.is_empty());
        assert_eq!(plan.entry.cover_image, stored.cover_image);
        assert_eq!(
            plan.entry.sections[0].image.as_deref(),
            Some("/static/pac_times/issue_5_section_0_a.png")
        );
        for section in &plan.entry.sections[1..] {
            assert_eq!(section.image, None, "section: {}", section.heading);
        }
    }

    #[test]
    fn new_record_cannot_keep_any_reference() {
        let form = issue_form("6", "Fresh")
            .with_text("is_edit", "true")
            .with_text("section_0_heading", "Borrowed")
            .with_text(
                "section_0_existing_image",
                "/static/pac_times/issue_5_section_0_a.png",
            );
        let plan = plan::<Issue>(&form, None).expect("plan");
        assert_eq!(plan.entry.sections[0].image, None);
    }

    #[test]
    fn edit_of_unknown_record_falls_back_to_no_cover() {
        let form = UploadForm::new()
            .with_text("event_number", "9")
            .with_text("title", "Ghost")
            .with_text("is_edit", "true")
            .with_text("heading", "Flat heading");
        let plan = plan::<Event>(&form, None).expect("plan");
        assert_eq!(plan.entry.cover_image, None);
        assert_eq!(plan.entry.heading, "Flat heading");
    }

    fn stored_album(photos: &[&str]) -> Album {
        Album {
            album_number: "2".to_string(),
            title: "Star party".to_string(),
            album_date: String::new(),
            description: String::new(),
            upload_date: String::new(),
            cover_image: Some("/static/photo_gallery/album_2_cover_c.png".to_string()),
            photos: photos.iter().map(|photo| photo.to_string()).collect(),
        }
    }

    #[test]
    fn album_photos_keep_existing_then_append_uploads() {
        let stored = stored_album(&["/static/photo_gallery/album_2_photo_0_a.png"]);
        let form = UploadForm::new()
            .with_text("album_number", "2")
            .with_text("title", "Star party")
            .with_text("description", "Clear skies")
            .with_text("is_edit", "true")
            .with_text("existing_photos[]", "/static/photo_gallery/album_2_photo_0_a.png")
            .with_text("existing_photos[]", "/static/photo_gallery/album_2_photo_0_a.png")
            .with_file("photo_0", "b.jpg", b"jpg")
            .with_file("photo_1", "c.jpeg", b"jpeg")
            .with_file("photo_3", "skipped.png", b"png");

        let plan = plan::<Album>(&form, Some(&stored)).expect("plan");
        assert_eq!(plan.entry.description, "Clear skies");
        assert_eq!(
            plan.entry.photos,
            vec![
                "/static/photo_gallery/album_2_photo_0_a.png".to_string(),
                "/static/photo_gallery/album_2_photo_0_b.jpg".to_string(),
                "/static/photo_gallery/album_2_photo_1_c.jpeg".to_string(),
            ]
        );
        assert_eq!(plan.pending.len(), 2);
    }

    #[test]
    fn upload_matching_a_kept_name_is_stored_under_a_new_name() {
        let kept = "/static/photo_gallery/album_2_photo_0_a.png";
        let stored = stored_album(&[kept]);
        let form = UploadForm::new()
            .with_text("album_number", "2")
            .with_text("title", "Star party")
            .with_text("is_edit", "true")
            .with_text("existing_photos[]", kept)
            .with_file("photo_0", "a.png", b"replacement");

        let plan = plan::<Album>(&form, Some(&stored)).expect("plan");
        assert_eq!(plan.entry.photos.len(), 2);
        assert_eq!(plan.entry.photos[0], kept);
        assert_ne!(plan.entry.photos[1], kept);

        let renamed = &plan.pending[0].stored_name;
        assert!(renamed.starts_with("album_2_photo_0_"), "name: {}", renamed);
        assert!(renamed.ends_with("_a.png"), "name: {}", renamed);
        assert_ne!(renamed, "album_2_photo_0_a.png");
        assert_eq!(
            plan.entry.photos[1],
            format!("/static/photo_gallery/{}", renamed)
        );
    }

    #[test]
    fn orphaned_refs_lists_images_no_longer_used() {
        let previous = Issue {
            issue_number: "1".to_string(),
            title: "t".to_string(),
            issue_date: String::new(),
            upload_date: String::new(),
            cover_image: Some("/static/pac_times/a.png".to_string()),
            sections: vec![
                Section {
                    heading: "h".to_string(),
                    body: String::new(),
                    image: Some("/static/pac_times/s0.png".to_string()),
                },
                Section {
                    heading: "h".to_string(),
                    body: String::new(),
                    image: Some("/static/pac_times/s1.png".to_string()),
                },
            ],
        };
        let mut current = previous.clone();
        current.cover_image = Some("/static/pac_times/b.png".to_string());
        current.sections.truncate(1);

        assert_eq!(
            orphaned_refs(&previous, &current),
            vec![
                "/static/pac_times/a.png".to_string(),
                "/static/pac_times/s1.png".to_string()
            ]
        );
    }
}

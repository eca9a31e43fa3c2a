//! Category collections: directory file plus image folder behind one write lock.

mod directory;


pub use directory::{Directory, DirectoryDocument, Upserted};

use crate::constants::{DIRECTORY_FILE_NAME, UPLOAD_DATE_FORMAT};
use crate::error::AppError;
use crate::form::UploadForm;
use crate::images::{discard_files, ImageStore};
use crate::intake::{
    invalid_number, orphaned_refs, plan_upload, RequiredFields, UploadLimits, COVER_FIELD,
};
use crate::models::{number_key, Album, Category, Entry, Event, Issue, ReadingCircleEntry};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Local wall-clock time in the stored `upload_date` format.
pub fn upload_timestamp() -> String {
    chrono::Local::now().format(UPLOAD_DATE_FORMAT).to_string()
}

/// One category: its directory file, its image folder, and the lock that
/// serializes every read-modify-write against them.
pub struct Collection<E> {
    directory: Directory<E>,
    images: ImageStore,
    write_lock: Mutex<()>,
}

impl<E: Entry> Collection<E> {
    /// Open the category below `storage_root`, creating its folder and an
    /// empty directory file when missing.
    ///
    /// # Errors
    /// Returns an error when the folder or file cannot be created.
    pub fn open(storage_root: &Path) -> Result<Self, AppError> {
        let category = E::CATEGORY;
        let images = ImageStore::new(storage_root, category);
        fs::create_dir_all(images.root())?;
        let directory = Directory::new(images.root().join(DIRECTORY_FILE_NAME));
        if directory.ensure_exists()? {
            tracing::info!("Created empty {} directory at {:?}", category, directory.path());
        }
        Ok(Self {
            directory,
            images,
            write_lock: Mutex::new(()),
        })
    }

    pub fn category(&self) -> Category {
        E::CATEGORY
    }

    pub fn directory(&self) -> &Directory<E> {
        &self.directory
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    fn write_guard(&self) -> Result<MutexGuard<'_, ()>, AppError> {
        self.write_lock.lock().map_err(|_| {
            AppError::StorageMessage(format!("{} write lock poisoned", E::CATEGORY))
        })
    }

    /// See [`Directory::list`].
    pub fn list(&self, limit: Option<usize>) -> Result<Vec<E>, AppError> {
        self.directory.list(limit)
    }

    /// Look up a record by its client-supplied number.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] when `number` is not an integer.
    pub fn get(&self, number: &str) -> Result<Option<E>, AppError> {
        let key = self.parse_number(number)?;
        self.directory.get(key)
    }

    /// Insert or replace a fully built record, preserving the stored `upload_date`.
    pub fn upsert(&self, entry: E) -> Result<Upserted<E>, AppError> {
        let _guard = self.write_guard()?;
        self.directory.upsert(entry)
    }

    /// Validate an upload, write its images, and upsert the record.
    ///
    /// Images the replaced record referenced but the new one does not are
    /// removed afterwards. When the directory write fails, images written for
    /// this request are removed again unless the stored record still uses them.
    ///
    /// # Returns
    /// The record as stored.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] for invalid input (with no side
    /// effects), or a storage error.
    pub fn submit(&self, form: &UploadForm, limits: UploadLimits) -> Result<E, AppError> {
        let required = RequiredFields::from_form::<E>(form)?;
        let _guard = self.write_guard()?;

        let existing = self.directory.get(required.key)?;
        if let Some(old_cover) = form.text("old_cover_image") {
            tracing::debug!(
                "Client sent old_cover_image '{}' for {} {}",
                old_cover,
                E::CATEGORY,
                required.number
            );
        }

        let number = required.number.clone();
        let plan = plan_upload(
            form,
            required,
            existing.as_ref(),
            &self.images,
            limits,
            upload_timestamp(),
        )?;
        let written = self.images.save_all(&plan.pending)?;

        match self.directory.upsert(plan.entry) {
            Ok(Upserted { stored, replaced }) => {
                if let Some(previous) = replaced {
                    for orphan in orphaned_refs(&previous, &stored) {
                        if self.images.remove(&orphan) {
                            tracing::debug!("Removed orphaned image {}", orphan);
                        }
                    }
                }
                tracing::info!(
                    "Stored {} {} ({} new images{})",
                    E::CATEGORY,
                    number,
                    written.len(),
                    if form.file(COVER_FIELD).is_some() { ", new cover" } else { "" }
                );
                Ok(stored)
            }
            Err(err) => {
                let still_used: Vec<PathBuf> = existing
                    .iter()
                    .flat_map(|entry| entry.image_refs())
                    .filter_map(|path_ref| self.images.resolve(path_ref))
                    .collect();
                let fresh: Vec<PathBuf> = written
                    .into_iter()
                    .filter(|path| !still_used.contains(path))
                    .collect();
                discard_files(&fresh);
                Err(err)
            }
        }
    }

    /// Remove the record with `number` and its images.
    ///
    /// # Returns
    /// The removed record, or `None` when no record has that number.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] for a non-integer number, or a storage error.
    pub fn delete(&self, number: &str) -> Result<Option<E>, AppError> {
        let key = self.parse_number(number)?;
        let _guard = self.write_guard()?;
        let Some(removed) = self.directory.remove(key)? else {
            return Ok(None);
        };
        for path_ref in removed.image_refs() {
            self.images.remove(path_ref);
        }
        tracing::info!("Deleted {} {}", E::CATEGORY, removed.number());
        Ok(Some(removed))
    }

    fn parse_number(&self, number: &str) -> Result<u64, AppError> {
        number_key(number).ok_or_else(|| invalid_number(E::CATEGORY.number_field(), number))
    }
}

/// Record types reachable from a [`Library`].
pub trait Catalogued: Entry {
    fn collection(library: &Library) -> &Collection<Self>;
}

impl Catalogued for Issue {
    fn collection(library: &Library) -> &Collection<Self> {
        &library.issues
    }
}

impl Catalogued for Event {
    fn collection(library: &Library) -> &Collection<Self> {
        &library.events
    }
}

impl Catalogued for ReadingCircleEntry {
    fn collection(library: &Library) -> &Collection<Self> {
        &library.reading_circle
    }
}

impl Catalogued for Album {
    fn collection(library: &Library) -> &Collection<Self> {
        &library.albums
    }
}

/// Every category collection below one storage root.
pub struct Library {
    root: PathBuf,
    pub issues: Collection<Issue>,
    pub events: Collection<Event>,
    pub reading_circle: Collection<ReadingCircleEntry>,
    pub albums: Collection<Album>,
}

impl Library {
    /// Open (and initialize where missing) every category below `storage_root`.
    ///
    /// # Errors
    /// Returns an error when any category folder or directory file cannot be created.
    pub fn open(storage_root: impl AsRef<Path>) -> Result<Self, AppError> {
        let root = storage_root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self {
            issues: Collection::open(&root)?,
            events: Collection::open(&root)?,
            reading_circle: Collection::open(&root)?,
            albums: Collection::open(&root)?,
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn collection<E: Catalogued>(&self) -> &Collection<E> {
        E::collection(self)
    }
}

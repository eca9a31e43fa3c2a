//! One category directory: a JSON object holding a single sorted record list.

use crate::error::AppError;
use crate::intake::invalid_number;
use crate::models::{number_key, Entry};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// `{ "<items_key>": entries }`, the on-disk and on-the-wire directory shape.
#[derive(Debug, Clone)]
pub struct DirectoryDocument<T> {
    pub items_key: &'static str,
    pub entries: T,
}

impl<T: Serialize> Serialize for DirectoryDocument<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.items_key, &self.entries)?;
        map.end()
    }
}

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted<E> {
    /// The record as written, with any preserved `upload_date`.
    pub stored: E,
    /// The record it replaced, when the number already existed.
    pub replaced: Option<E>,
}

/// Accessor for one `directory.json` file.
///
/// Reads never lock: writes replace the file atomically. Mutating methods
/// are crate-private so that every write goes through the owning
/// [`super::Collection`] and its write lock.
pub struct Directory<E> {
    path: PathBuf,
    items_key: &'static str,
    _entries: PhantomData<fn() -> E>,
}

fn stored_key<E: Entry>(entry: &E) -> Result<u64, AppError> {
    number_key(entry.number()).ok_or_else(|| {
        AppError::StorageMessage(format!(
            "{} directory holds non-numeric {} '{}'",
            E::CATEGORY,
            E::CATEGORY.number_field(),
            entry.number()
        ))
    })
}

/// Order entries by integer number; stable for equal keys.
fn sort_by_number<E: Entry>(entries: Vec<E>, descending: bool) -> Result<Vec<E>, AppError> {
    let mut keyed = entries
        .into_iter()
        .map(|entry| stored_key(&entry).map(|key| (key, entry)))
        .collect::<Result<Vec<_>, _>>()?;
    if descending {
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
    } else {
        keyed.sort_by_key(|(key, _)| *key);
    }
    Ok(keyed.into_iter().map(|(_, entry)| entry).collect())
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let parent = path.parent().ok_or_else(|| {
        AppError::StorageMessage(format!("Directory path {:?} has no parent", path))
    })?;
    fs::create_dir_all(parent)?;

    let tmp_path = parent.join(format!(".directory-{}.tmp", uuid::Uuid::new_v4().simple()));
    let data = serde_json::to_vec_pretty(value)?;
    if let Err(err) = fs::write(&tmp_path, &data) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    fs::rename(&tmp_path, path).map_err(|err| {
        let _ = fs::remove_file(&tmp_path);
        AppError::from(err)
    })
}

impl<E: Entry> Directory<E> {
    /// Bind the directory file at `path` for record type `E`.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            items_key: E::CATEGORY.items_key(),
            _entries: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with an empty list when it does not exist yet.
    ///
    /// # Returns
    /// `true` when the file was created.
    ///
    /// # Errors
    /// Returns an error when the file cannot be written.
    pub fn ensure_exists(&self) -> Result<bool, AppError> {
        if self.path.exists() {
            return Ok(false);
        }
        self.save(&[])?;
        Ok(true)
    }

    /// Read every record in stored order.
    ///
    /// A missing file reads as an empty directory.
    ///
    /// # Errors
    /// Returns an error when the file is unreadable, is not a JSON object,
    /// lacks the items key, or holds malformed records.
    pub fn load(&self) -> Result<Vec<E>, AppError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut document: serde_json::Map<String, serde_json::Value> =
            serde_json::from_slice(&bytes)?;
        let items = document.remove(self.items_key).ok_or_else(|| {
            AppError::StorageMessage(format!(
                "{:?} is missing the '{}' list",
                self.path, self.items_key
            ))
        })?;
        Ok(serde_json::from_value(items)?)
    }

    /// Find the record whose number equals `key`.
    pub fn get(&self, key: u64) -> Result<Option<E>, AppError> {
        Ok(self
            .load()?
            .into_iter()
            .find(|entry| number_key(entry.number()) == Some(key)))
    }

    /// List records for display.
    ///
    /// # Arguments
    /// - `limit`: When set, only the `limit` highest numbers, highest first.
    ///
    /// # Returns
    /// Stored order without a limit; descending and truncated with one.
    pub fn list(&self, limit: Option<usize>) -> Result<Vec<E>, AppError> {
        let entries = self.load()?;
        let Some(limit) = limit else {
            return Ok(entries);
        };
        let mut newest_first = sort_by_number(entries, true)?;
        newest_first.truncate(limit);
        Ok(newest_first)
    }

    /// Insert or replace the record with the same number, then re-sort and persist.
    ///
    /// A replaced record's `upload_date` is carried forward into the new one.
    ///
    /// # Errors
    /// Returns [`AppError::BadRequest`] for a non-numeric incoming number, or a
    /// storage error for unreadable/malformed existing data or a failed write.
    pub(crate) fn upsert(&self, mut entry: E) -> Result<Upserted<E>, AppError> {
        let key = number_key(entry.number())
            .ok_or_else(|| invalid_number(E::CATEGORY.number_field(), entry.number()))?;
        let mut entries = self.load()?;

        let position = entries
            .iter()
            .position(|existing| number_key(existing.number()) == Some(key));
        let replaced = match position {
            Some(index) => {
                let original_upload = entries[index].upload_date();
                if !original_upload.is_empty() {
                    entry.set_upload_date(original_upload.to_string());
                }
                Some(std::mem::replace(&mut entries[index], entry.clone()))
            }
            None => {
                entries.push(entry.clone());
                None
            }
        };

        let entries = sort_by_number(entries, false)?;
        self.save(&entries)?;
        Ok(Upserted {
            stored: entry,
            replaced,
        })
    }

    /// Remove the record whose number equals `key` and persist.
    ///
    /// # Returns
    /// The removed record; `None` (without rewriting the file) when absent.
    pub(crate) fn remove(&self, key: u64) -> Result<Option<E>, AppError> {
        let mut entries = self.load()?;
        let Some(index) = entries
            .iter()
            .position(|entry| number_key(entry.number()) == Some(key))
        else {
            return Ok(None);
        };
        let removed = entries.remove(index);
        self.save(&entries)?;
        Ok(Some(removed))
    }

    fn save(&self, entries: &[E]) -> Result<(), AppError> {
        write_json_atomic(
            &self.path,
            &DirectoryDocument {
                items_key: self.items_key,
                entries,
            },
        )
    }
}

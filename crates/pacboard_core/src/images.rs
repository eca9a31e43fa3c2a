//! Image allow-listing, stored-name derivation, and blob files on disk.

use crate::constants::{ALLOWED_IMAGE_EXTENSIONS, STATIC_URL_PREFIX};
use crate::error::AppError;
use crate::models::Category;
use std::fs;
use std::path::{Path, PathBuf};

/// Whether `file_name` ends in an allowed image extension (case-insensitive).
pub fn is_allowed_image(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .map(|(_, extension)| {
            let extension = extension.to_ascii_lowercase();
            ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str())
        })
        .unwrap_or(false)
}

/// Reduce a client-supplied name to a safe flat file name.
///
/// Keeps ASCII alphanumerics, `.`, `_`, and `-`; whitespace runs become a
/// single `_`; everything else is dropped. Leading dots and underscores are
/// stripped so the result can never be hidden or walk upwards.
pub fn sanitize_file_name(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            if pending_space && !cleaned.is_empty() {
                cleaned.push('_');
            }
            pending_space = false;
            cleaned.push(ch);
        }
    }
    cleaned.trim_start_matches(['.', '_']).to_string()
}

/// Image blobs of one category, stored flat next to its directory file.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
    url_prefix: String,
}

impl ImageStore {
    /// Bind the image folder of `category` below `storage_root`.
    pub fn new(storage_root: &Path, category: Category) -> Self {
        Self {
            root: storage_root.join(category.storage_dir()),
            url_prefix: format!("{}/{}/", STATIC_URL_PREFIX, category.storage_dir()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Server-relative reference embedded in records for `stored_name`.
    pub fn path_ref(&self, stored_name: &str) -> String {
        format!("{}{}", self.url_prefix, stored_name)
    }

    /// Map a stored reference back to a file inside this category folder.
    ///
    /// # Returns
    /// `None` for references outside the folder, nested paths, or names
    /// that would escape it.
    pub fn resolve(&self, path_ref: &str) -> Option<PathBuf> {
        let name = path_ref.strip_prefix(&self.url_prefix)?;
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\'])
        {
            return None;
        }
        Some(self.root.join(name))
    }

    /// Write every pending image.
    ///
    /// On failure, files written by this call are removed again before the
    /// error is returned.
    ///
    /// # Returns
    /// Paths of the files written, in input order.
    ///
    /// # Errors
    /// Returns the first I/O error encountered.
    pub fn save_all(&self, pending: &[PendingImage<'_>]) -> Result<Vec<PathBuf>, AppError> {
        fs::create_dir_all(&self.root)?;
        let mut written = Vec::with_capacity(pending.len());
        for image in pending {
            let path = self.root.join(&image.stored_name);
            if let Err(err) = fs::write(&path, image.bytes) {
                tracing::error!("Failed to save image {:?}: {}", path, err);
                discard_files(&written);
                return Err(err.into());
            }
            written.push(path);
        }
        Ok(written)
    }

    /// Delete the file behind `path_ref`, best-effort.
    ///
    /// # Returns
    /// `true` when a file was removed.
    pub fn remove(&self, path_ref: &str) -> bool {
        let Some(path) = self.resolve(path_ref) else {
            tracing::warn!(
                "Skipping removal of image '{}' outside {:?}",
                path_ref,
                self.root
            );
            return false;
        };
        match fs::remove_file(&path) {
            Ok(()) => true,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Image {:?} already absent", path);
                false
            }
            Err(err) => {
                tracing::warn!("Failed to remove image {:?}: {}", path, err);
                false
            }
        }
    }
}

/// An accepted upload waiting to be written under its stored name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage<'a> {
    pub stored_name: String,
    pub bytes: &'a [u8],
}

/// Remove files written earlier in a failed request, best-effort.
pub fn discard_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(err) = fs::remove_file(path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to discard image {:?}: {}", path, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn allow_list_matches_extension_case_insensitively() {
        for name in ["cover.png", "cover.JPG", "scan.final.Jpeg"] {
            assert!(is_allowed_image(name), "name: {}", name);
        }
        for name in ["photo.gif", "png", "cover.png.exe", "noext"] {
            assert!(!is_allowed_image(name), "name: {}", name);
        }
    }

    #[test]
    fn sanitize_file_name_flattens_hostile_names() {
        let cases = [
            ("issue_3_cover_my photo.png", "issue_3_cover_my_photo.png"),
            ("../../etc/passwd", "etcpasswd"),
            ("..hidden.png", "hidden.png"),
            ("a\\b/c.jpg", "abc.jpg"),
            ("été.png", "t.png"),
        ];
        for (raw, expected) in cases {
            assert_eq!(sanitize_file_name(raw), expected, "raw: {}", raw);
        }
    }

    #[test]
    fn resolve_only_accepts_flat_names_in_own_folder() {
        let temp = TempDir::new().expect("temp dir");
        let store = ImageStore::new(temp.path(), Category::PacTimes);

        let path_ref = store.path_ref("issue_1_cover_a.png");
        assert_eq!(path_ref, "/static/pac_times/issue_1_cover_a.png");
        assert_eq!(
            store.resolve(&path_ref),
            Some(temp.path().join("pac_times").join("issue_1_cover_a.png"))
        );

        assert!(store.resolve("/static/pac_events/event_1_cover_a.png").is_none());
        assert!(store.resolve("/static/pac_times/../directory.json").is_none());
        assert!(store.resolve("/static/pac_times/").is_none());
        assert!(store.resolve("/static/pac_times/..").is_none());
    }

    #[test]
    fn remove_is_best_effort_for_missing_files() {
        let temp = TempDir::new().expect("temp dir");
        let store = ImageStore::new(temp.path(), Category::PhotoAlbums);
        let pending = [PendingImage {
            stored_name: "album_2_photo_0_x.png".to_string(),
            bytes: b"png",
        }];

        let written = store.save_all(&pending).expect("save");
        assert_eq!(written.len(), 1);
        assert!(written[0].exists());

        let path_ref = store.path_ref("album_2_photo_0_x.png");
        assert!(store.remove(&path_ref));
        assert!(!written[0].exists());
        assert!(!store.remove(&path_ref));
    }
}

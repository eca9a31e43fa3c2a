//! Content categories served by the directory store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four independently stored content categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// PAC Times magazine issues.
    PacTimes,
    /// Club events.
    PacEvents,
    /// Reading-circle sessions.
    ReadingCircle,
    /// Photo gallery albums.
    PhotoAlbums,
}

/// How a category stores the ordered content below its cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyLayout {
    /// `section_{i}_*` fields with heading, body, and optional image.
    Sections,
    /// `photo_{i}` files plus `existing_photos[]` references.
    Photos,
}

impl Category {
    /// Every category, in the order they are initialized.
    pub const ALL: [Category; 4] = [
        Category::PacTimes,
        Category::PacEvents,
        Category::ReadingCircle,
        Category::PhotoAlbums,
    ];

    /// Top-level key holding the record list in the directory file.
    pub fn items_key(self) -> &'static str {
        match self {
            Category::PacTimes => "issues",
            Category::PacEvents | Category::ReadingCircle => "events",
            Category::PhotoAlbums => "albums",
        }
    }

    /// Form/JSON field carrying the record number.
    pub fn number_field(self) -> &'static str {
        match self {
            Category::PacTimes => "issue_number",
            Category::PacEvents | Category::ReadingCircle => "event_number",
            Category::PhotoAlbums => "album_number",
        }
    }

    /// Form/JSON field carrying the free-form display date.
    pub fn date_field(self) -> &'static str {
        match self {
            Category::PacTimes => "issue_date",
            Category::PacEvents | Category::ReadingCircle => "event_date",
            Category::PhotoAlbums => "album_date",
        }
    }

    /// Folder below the storage root holding the directory file and images.
    pub fn storage_dir(self) -> &'static str {
        match self {
            Category::PacTimes => "pac_times",
            Category::PacEvents => "pac_events",
            Category::ReadingCircle => "reading_circle",
            Category::PhotoAlbums => "photo_gallery",
        }
    }

    /// Prefix of stored image file names.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Category::PacTimes => "issue",
            Category::PacEvents => "event",
            Category::ReadingCircle => "reading_circle",
            Category::PhotoAlbums => "album",
        }
    }

    /// Whether records carry sections or a photo list.
    pub fn layout(self) -> BodyLayout {
        match self {
            Category::PhotoAlbums => BodyLayout::Photos,
            _ => BodyLayout::Sections,
        }
    }

    /// Human-readable singular name used in response messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Category::PacTimes => "Issue",
            Category::PacEvents => "Event",
            Category::ReadingCircle => "Reading circle entry",
            Category::PhotoAlbums => "Album",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_dir())
    }
}

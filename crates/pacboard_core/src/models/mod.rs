//! Directory records and the metadata describing each content category.

/// Category identifiers and their wire/storage names.
pub mod category;
/// Record types stored in the category directories.
pub mod record;


pub use category::{BodyLayout, Category};
pub use record::{Album, Entry, Event, Issue, ReadingCircleEntry, Section, Submission};

/// Parse a record number into its integer sort key.
///
/// Numbers are kept as display strings on the wire but must consist of ASCII
/// digits only (surrounding whitespace is ignored).
///
/// # Returns
/// The numeric key, or `None` when the value is empty, signed, or overflows `u64`.
pub fn number_key(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

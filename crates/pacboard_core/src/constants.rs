//! Shared constants used across PACBoard crates.

/// Default API port (matches the port the frontend has always talked to).
pub const DEFAULT_PORT: u16 = 5000;

/// Default storage root holding every category directory.
pub const DEFAULT_STATIC_ROOT: &str = "./static";

/// URL prefix under which stored blobs are served.
pub const STATIC_URL_PREFIX: &str = "/static";

/// Default maximum request body size accepted by the API layer.
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// Default maximum size of a single uploaded image.
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Default credential for the admin login check.
pub const DEFAULT_ADMIN_PASSWORD: &str = "pacadmin";

/// Default frontend dev-server origin allowed by CORS.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// File name of the JSON directory inside each category folder.
pub const DIRECTORY_FILE_NAME: &str = "directory.json";

/// Image extensions accepted for uploads (compared case-insensitively).
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Timestamp format used for `upload_date`.
pub const UPLOAD_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

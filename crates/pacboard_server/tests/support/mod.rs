//! Shared integration-test server bootstrap helpers.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use pacboard_server::{create_app, AppState, Config};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub(crate) const TEST_PASSWORD: &str = "orion-belt";

pub(crate) fn test_config_for_root(storage_root: &Path) -> Config {
    Config {
        storage_root: storage_root.to_str().expect("storage root").to_string(),
        port: 0,
        max_upload_size: 5_000_000,
        max_file_size: 1_000_000,
        admin_password: TEST_PASSWORD.to_string(),
        allowed_origins: vec!["http://localhost:5173".to_string()],
    }
}

pub(crate) fn test_server_for_config(config: Config) -> TestServer {
    let state = AppState::open(config).expect("open library");
    let app = create_app(state, false);
    TestServer::new(app).expect("server")
}

pub(crate) fn setup_test_server() -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let config = test_config_for_root(temp_dir.path());
    (test_server_for_config(config), temp_dir)
}

/// Bytes standing in for an uploaded PNG.
pub(crate) fn png() -> Vec<u8> {
    b"\x89PNG\r\n\x1a\nintegration".to_vec()
}

pub(crate) fn image_part(file_name: &str) -> Part {
    Part::bytes(png()).file_name(file_name).mime_type("image/png")
}

/// Issue upload with the required fields and a `cover.png` cover.
pub(crate) fn issue_form(number: &str, title: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("issue_number", number)
        .add_text("title", title)
        .add_part("cover_image", image_part("cover.png"))
}

pub(crate) fn category_dir(root: &TempDir, storage_dir: &str) -> PathBuf {
    root.path().join(storage_dir)
}

/// Every file in a category folder except its directory file.
pub(crate) fn stored_images(root: &TempDir, storage_dir: &str) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(category_dir(root, storage_dir))
        .expect("category dir")
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name != "directory.json")
        .collect();
    names.sort();
    names
}

pub(crate) fn read_directory(root: &TempDir, storage_dir: &str) -> String {
    std::fs::read_to_string(category_dir(root, storage_dir).join("directory.json"))
        .expect("directory file")
}

//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_ADMIN_PASSWORD, DEFAULT_ALLOWED_ORIGIN, DEFAULT_MAX_FILE_SIZE,
    DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_PORT, DEFAULT_STATIC_ROOT,
};
use crate::intake::UploadLimits;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Runtime configuration for PACBoard.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Root folder holding one sub-folder per category.
    pub storage_root: String,
    pub port: u16,
    /// Whole request body limit in bytes.
    pub max_upload_size: usize,
    /// Per-image limit in bytes.
    pub max_file_size: usize,
    pub admin_password: String,
    /// Extra origins allowed by CORS when public access is disabled.
    pub allowed_origins: Vec<String>,
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    None
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

/// Split a comma-separated origin list, dropping blanks.
pub fn parse_origin_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid {}='{}', using default", name, raw);
            None
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self {
            storage_root: env::var("STATIC_ROOT")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(expand_tilde)
                .unwrap_or_else(|| DEFAULT_STATIC_ROOT.to_string()),
            port: parsed_var("PORT").unwrap_or(DEFAULT_PORT),
            max_upload_size: parsed_var("MAX_UPLOAD_SIZE").unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),
            max_file_size: parsed_var("MAX_FILE_SIZE").unwrap_or(DEFAULT_MAX_FILE_SIZE),
            admin_password: env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string()),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|value| parse_origin_list(&value))
                .unwrap_or_else(|_| vec![DEFAULT_ALLOWED_ORIGIN.to_string()]),
        }
    }

    /// Limits applied while validating uploaded images.
    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_file_size: self.max_file_size,
        }
    }
}

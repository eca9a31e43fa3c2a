//! Upload, list, and delete handlers shared by every category.
//!
//! Each handler is generic over the record type; the router instantiates one
//! set per category.

use super::form::read_upload_form;
use crate::{error::HttpError, AppError, AppState};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    Json,
};
use pacboard_core::models::number_key;
use pacboard_core::store::{Catalogued, DirectoryDocument};
use serde::Deserialize;
use serde_json::{json, Value};

/// Query parameters accepted by list routes.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
}

/// Parse `?limit=`; absent or blank means "everything".
fn parse_limit(raw: Option<&str>) -> Result<Option<usize>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    match number_key(raw).and_then(|value| usize::try_from(value).ok()) {
        Some(0) | None => Err(AppError::BadRequest(format!(
            "Invalid limit '{}': expected a positive integer",
            raw
        ))),
        Some(limit) => Ok(Some(limit)),
    }
}

/// Store a submitted record and its images.
///
/// # Arguments
/// - `state`: Application state.
/// - `multipart`: Submitted form.
///
/// # Returns
/// `{ success, message, <number field> }` as JSON.
///
/// # Errors
/// Returns 400 for invalid submissions and 500 when storage fails.
pub async fn upload<E: Catalogued>(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, HttpError> {
    let category = E::CATEGORY;
    let form = read_upload_form(multipart?).await?;
    let stored = state
        .library
        .collection::<E>()
        .submit(&form, state.config.upload_limits())
        .map_err(|err| {
            match &err {
                AppError::BadRequest(msg) => {
                    tracing::warn!("Rejected {} upload: {}", category, msg)
                }
                other => tracing::error!("Failed to store {} upload: {}", category, other),
            }
            err
        })?;

    let mut body = json!({ "success": true, "message": "Upload successful" });
    body[category.number_field()] = Value::String(stored.number().to_string());
    Ok(Json(body))
}

/// List a category's records.
///
/// # Arguments
/// - `state`: Application state.
/// - `query`: Optional `limit`.
///
/// # Returns
/// `{ <items key>: [...] }`, newest first when limited.
///
/// # Errors
/// Returns 400 for a bad limit and 500 when the directory cannot be read.
pub async fn list<E: Catalogued>(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<DirectoryDocument<Vec<E>>>, HttpError> {
    let limit = parse_limit(query.limit.as_deref())?;
    let entries = state.library.collection::<E>().list(limit)?;
    Ok(Json(DirectoryDocument {
        items_key: E::CATEGORY.items_key(),
        entries,
    }))
}

/// Delete a record and its images by number.
///
/// # Arguments
/// - `state`: Application state.
/// - `number`: Record number from the path.
///
/// # Returns
/// `{ message }` as JSON.
///
/// # Errors
/// Returns 404 when no record has the number, 400 for a non-integer number.
pub async fn remove<E: Catalogued>(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<Value>, HttpError> {
    let category = E::CATEGORY;
    let removed = state
        .library
        .collection::<E>()
        .delete(&number)
        .map_err(|err| {
            tracing::error!("Failed to delete {} {}: {}", category, number, err);
            err
        })?;

    match removed {
        Some(_) => Ok(Json(json!({
            "message": format!("{} deleted successfully", category.display_name())
        }))),
        None => Err(AppError::NotFound(format!(
            "{} {} not found",
            category.display_name(),
            number
        ))
        .into()),
    }
}

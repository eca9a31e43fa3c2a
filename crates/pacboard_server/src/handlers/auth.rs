//! Admin password check.

use super::form::read_upload_form;
use crate::{error::HttpError, AppError, AppState};
use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Default, Deserialize)]
struct LoginForm {
    password: Option<String>,
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

async fn read_password(request: Request, state: &AppState) -> Result<Option<String>, HttpError> {
    if is_multipart(&request) {
        let multipart = Multipart::from_request(request, state).await?;
        let form = read_upload_form(multipart).await?;
        return Ok(form.text("password").map(str::to_string));
    }
    // An unreadable urlencoded body counts as no password.
    Ok(Form::<LoginForm>::from_request(request, state)
        .await
        .ok()
        .and_then(|Form(login)| login.password))
}

/// Check the submitted `password` against the configured admin password.
///
/// # Returns
/// 202 with `{ message }` on an exact match.
///
/// # Errors
/// Returns 401 for a missing or wrong password.
pub async fn handle_login(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<Value>), HttpError> {
    let password = read_password(request, &state).await?;
    if password.as_deref() == Some(state.config.admin_password.as_str()) {
        tracing::info!("Admin login accepted");
        return Ok((
            StatusCode::ACCEPTED,
            Json(json!({ "message": "Login successful" })),
        ));
    }
    tracing::warn!("Admin login rejected");
    Err(AppError::Unauthorized("Incorrect password".to_string()).into())
}

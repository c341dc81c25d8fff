//! Account self-service: profile, location, deletion and the role-specific
//! uploads (company logo, service-provider photo and availability).

use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::envelope::Reply;
use super::error::ApiError;
use super::multipart::read_form;
use crate::auth::Claims;
use crate::db::{Account, Location};
use crate::services::ProfileUpdate;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvailabilityRequest {
    pub available_days: Vec<String>,
    pub available_hours: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LogoResponse {
    #[serde(rename = "logoURL")]
    pub logo_url: String,
}

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    #[serde(rename = "photoURL")]
    pub photo_url: String,
}

/// GET /api/users/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> Result<Reply<Account>, ApiError> {
    let account = state.accounts.get_profile(&claims.subject_id).await?;
    Ok(Reply::ok("Profile retrieved successfully", account))
}

/// PUT /api/users/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    body: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Reply<()>, ApiError> {
    let Json(update) = body?;

    state
        .accounts
        .update_profile(&claims.subject_id, update)
        .await?;
    Ok(Reply::message("Profile updated successfully"))
}

/// PUT /api/users/location
pub async fn update_location(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    body: Result<Json<UpdateLocationRequest>, JsonRejection>,
) -> Result<Reply<()>, ApiError> {
    let Json(request) = body?;

    state
        .accounts
        .update_location(&claims.subject_id, request.location)
        .await?;
    Ok(Reply::message("Location updated successfully"))
}

/// DELETE /api/users
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> Result<Reply<()>, ApiError> {
    state.accounts.delete_account(&claims.subject_id).await?;
    Ok(Reply::message("User deleted successfully"))
}

/// POST /api/company/logo - multipart `logo`
pub async fn upload_logo(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Reply<LogoResponse>, ApiError> {
    let file = read_form(multipart?)
        .await?
        .take_file("logo")
        .ok_or_else(|| ApiError::bad_request("No file uploaded or invalid file"))?;

    let logo_url = state.accounts.upload_logo(&claims.subject_id, file).await?;
    Ok(Reply::ok(
        "Company logo uploaded successfully",
        LogoResponse { logo_url },
    ))
}

/// POST /api/service-provider/photo - multipart `photo`
pub async fn upload_photo(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Reply<PhotoResponse>, ApiError> {
    let file = read_form(multipart?)
        .await?
        .take_file("photo")
        .ok_or_else(|| ApiError::bad_request("No file uploaded or invalid file"))?;

    let photo_url = state
        .accounts
        .upload_profile_photo(&claims.subject_id, file)
        .await?;
    Ok(Reply::ok(
        "Profile photo uploaded successfully",
        PhotoResponse { photo_url },
    ))
}

/// POST /api/service-provider/availability
pub async fn update_availability(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    body: Result<Json<AvailabilityRequest>, JsonRejection>,
) -> Result<Reply<()>, ApiError> {
    let Json(request) = body?;

    state
        .accounts
        .update_availability(
            &claims.subject_id,
            request.available_days,
            request.available_hours,
        )
        .await?;
    Ok(Reply::message("Availability updated successfully"))
}

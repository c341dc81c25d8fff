//! Input validation for API requests.
//!
//! For collecting multiple validation errors and returning them as an ApiError,
//! use the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

use super::error::ValidationErrorBuilder;
use crate::services::SignupRequest;

lazy_static! {
    /// Loose shape check: something@something.tld
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();

    /// Asset folders are single lowercase words
    static ref FOLDER_REGEX: Regex = Regex::new(r"^[a-z0-9_-]{1,32}$").unwrap();
}

/// Validate a UUID string
pub fn validate_uuid(id: &str, field_name: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err(format!("{} is required", field_name));
    }

    if uuid::Uuid::parse_str(id).is_err() {
        return Err(format!("Invalid {} format", field_name));
    }

    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 254 || !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }
    Ok(())
}

/// Validate the folder segment of an asset URL
pub fn validate_folder(folder: &str) -> Result<(), String> {
    if FOLDER_REGEX.is_match(folder) {
        Ok(())
    } else {
        Err("Invalid folder".to_string())
    }
}

/// Shape checks on a signup body. Required fields and the role tag are left
/// to the account directory so its messages stay authoritative.
pub fn validate_signup(req: &SignupRequest) -> Result<(), super::error::ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if !req.email.is_empty() {
        if let Err(e) = validate_email(&req.email) {
            errors.add("email", e);
        }
    }
    if let Some(location) = &req.location {
        if !(-90.0..=90.0).contains(&location.lat) {
            errors.add("location.lat", "Latitude must be between -90 and 90");
        }
        if !(-180.0..=180.0).contains(&location.lng) {
            errors.add("location.lng", "Longitude must be between -180 and 180");
        }
    }

    errors.finish()
}

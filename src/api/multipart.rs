//! Buffering of multipart bodies into a JSON `data` field plus file parts.

use axum::extract::{multipart::MultipartError, Multipart};
use axum::http::StatusCode;
use std::collections::HashMap;

use super::error::{ApiError, ErrorCode};
use crate::services::Upload;

#[derive(Debug, Default)]
pub struct FormParts {
    fields: HashMap<String, String>,
    files: Vec<(String, Upload)>,
}

impl FormParts {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The JSON payload part; absent and empty are the same
    pub fn data(&self) -> Option<&str> {
        self.field("data").filter(|d| !d.is_empty())
    }

    /// Every file sent under `name` (or `name[]`), in request order
    pub fn take_files(&mut self, name: &str) -> Vec<Upload> {
        let bracketed = format!("{}[]", name);
        let (matched, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|(field, _)| field == name || *field == bracketed);
        self.files = rest;
        matched.into_iter().map(|(_, upload)| upload).collect()
    }

    /// First file sent under `name`
    pub fn take_file(&mut self, name: &str) -> Option<Upload> {
        let index = self.files.iter().position(|(field, _)| field == name)?;
        Some(self.files.remove(index).1)
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(ErrorCode::PayloadTooLarge, "Upload exceeds the size limit")
    } else {
        ApiError::bad_request(format!("Failed to parse form data: {}", err.body_text()))
    }
}

/// Read the whole form. File parts are those carrying a filename.
pub async fn read_form(mut multipart: Multipart) -> Result<FormParts, ApiError> {
    let mut parts = FormParts::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                parts
                    .files
                    .push((name, Upload::new(file_name, content_type, data)));
            }
            None => {
                let text = field.text().await.map_err(multipart_error)?;
                parts.fields.insert(name, text);
            }
        }
    }

    Ok(parts)
}

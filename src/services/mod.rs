//! Domain components: the branch lifecycle and the account directory.

pub mod accounts;
pub mod branches;
pub mod error;

pub use accounts::{
    AccountDirectory, AuthSession, CompanyData, CompanySummary, ExternalIdentity, ProfileUpdate,
    SignupRequest,
};
pub use branches::BranchManager;
pub use error::{bounded, ServiceError, ServiceResult};

use bytes::Bytes;

/// One file part of a multipart request, fully buffered
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            data,
        }
    }

    /// Declared type is `image/*`, falling back to a guess from the file name
    pub fn is_image(&self) -> bool {
        match &self.content_type {
            Some(ct) if !ct.is_empty() => ct.starts_with("image/"),
            _ => mime_guess::from_path(&self.file_name)
                .first()
                .map(|mime| mime.type_() == mime_guess::mime::IMAGE)
                .unwrap_or(false),
        }
    }
}

use axum::extract::{
    multipart::MultipartRejection,
    rejection::{PathRejection, QueryRejection},
    Multipart, Path, Query, State,
};
use serde::Deserialize;
use std::sync::Arc;

use super::envelope::Reply;
use super::error::ApiError;
use super::multipart::{read_form, FormParts};
use super::validation::validate_uuid;
use crate::auth::Claims;
use crate::db::{Branch, BranchPatch};
use crate::services::Upload;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListBranchesQuery {
    #[serde(rename = "companyId")]
    pub company_id: Option<String>,
}

impl ListBranchesQuery {
    /// Clients send `null` or an empty string when they mean "my own"
    fn company_id(&self) -> Option<&str> {
        self.company_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != "null" && *id != "undefined")
    }
}

/// Split a branch form into its JSON patch and image files
fn branch_form(mut form: FormParts) -> Result<(BranchPatch, Vec<Upload>), ApiError> {
    let data = form
        .data()
        .ok_or_else(|| ApiError::bad_request("Branch data is required"))?;
    let patch = BranchPatch::from_json(data)
        .map_err(|e| ApiError::bad_request(format!("Invalid branch data format: {}", e)))?;

    Ok((patch, form.take_files("images")))
}

fn parse_branch_id(id: &str) -> Result<(), ApiError> {
    validate_uuid(id, "branch ID").map_err(|e| ApiError::validation_field("id", e))
}

/// POST /api/company/branches - multipart `data` plus any number of `images`
pub async fn create_branch(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Reply<Branch>, ApiError> {
    let (patch, images) = branch_form(read_form(multipart?).await?)?;

    let branch = state
        .branches
        .create(&claims.subject_id, patch, images)
        .await?;
    Ok(Reply::created("Branch created successfully", branch))
}

/// GET /api/company/branches?companyId=
pub async fn list_branches(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    query: Result<Query<ListBranchesQuery>, QueryRejection>,
) -> Result<Reply<Vec<Branch>>, ApiError> {
    let Query(query) = query?;
    let owner = query.company_id().unwrap_or(&claims.subject_id);

    let branches = state.branches.list(owner).await?;
    Ok(Reply::ok("Branches retrieved successfully", branches))
}

/// GET /api/companies/:id/branches
pub async fn list_company_branches(
    State(state): State<Arc<AppState>>,
    company_id: Result<Path<String>, PathRejection>,
) -> Result<Reply<Vec<Branch>>, ApiError> {
    let Path(company_id) = company_id?;
    let branches = state.branches.list(&company_id).await?;
    Ok(Reply::ok("Branches retrieved successfully", branches))
}

/// PUT /api/company/branches/:id
pub async fn update_branch(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    id: Result<Path<String>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Reply<Branch>, ApiError> {
    let Path(id) = id?;
    parse_branch_id(&id)?;
    let (patch, images) = branch_form(read_form(multipart?).await?)?;

    let branch = state
        .branches
        .update(&claims.subject_id, &id, patch, images)
        .await?;
    Ok(Reply::ok("Branch updated successfully", branch))
}

/// DELETE /api/company/branches/:id
pub async fn delete_branch(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    id: Result<Path<String>, PathRejection>,
) -> Result<Reply<()>, ApiError> {
    let Path(id) = id?;
    parse_branch_id(&id)?;

    // Leftover image files are logged by the manager and do not fail the request
    state.branches.delete(&claims.subject_id, &id).await?;
    Ok(Reply::message("Branch deleted successfully"))
}

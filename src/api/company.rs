use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;

use super::auth::Subject;
use super::envelope::Reply;
use super::error::ApiError;
use crate::auth::Claims;
use crate::db::ContactDetail;
use crate::services::CompanyData;
use crate::AppState;

/// GET /api/company/data
pub async fn get_company_data(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> Result<Reply<CompanyData>, ApiError> {
    let data = state.accounts.company_data(&claims.subject_id).await?;
    Ok(Reply::ok("Company data retrieved successfully", data))
}

/// PUT /api/company/data - contact details only.
///
/// Authenticated by subject alone, so tokens that carry `id` instead of
/// `userId` are accepted here.
pub async fn update_company_data(
    State(state): State<Arc<AppState>>,
    Subject(subject_id): Subject,
    body: Result<Json<ContactDetail>, JsonRejection>,
) -> Result<Reply<()>, ApiError> {
    let Json(detail) = body?;

    state
        .accounts
        .update_company_contacts(&subject_id, detail)
        .await?;
    Ok(Reply::message("Company data updated successfully"))
}

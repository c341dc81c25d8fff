use axum::{
    async_trait,
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Multipart, Request, State},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::envelope::Reply;
use super::error::ApiError;
use super::multipart::read_form;
use super::validation::validate_signup;
use crate::auth::Claims;
use crate::db::AccountRole;
use crate::services::{AuthSession, ExternalIdentity, ServiceError, SignupRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Subject identifier of a request authenticated by [`subject_middleware`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject(pub String);

/// Extract the bearer token from request headers
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn missing_token() -> ApiError {
    ApiError::unauthorized("Missing or malformed token")
}

/// Validate the bearer token and attach normalized [`Claims`] to the request
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers()).ok_or_else(missing_token)?;
    let claims = state.sessions.validate(token)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Validate the bearer token and attach only its subject.
///
/// Tokens from signers that write `id` instead of `userId`, or carry no role,
/// pass here but not through [`auth_middleware`].
pub async fn subject_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers()).ok_or_else(missing_token)?;
    let subject = state.sessions.subject(token)?;

    request.extensions_mut().insert(Subject(subject));
    Ok(next.run(request).await)
}

async fn require_role(
    allowed: &[AccountRole],
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(missing_token)?;

    if !claims.has_role(allowed) {
        tracing::debug!(account_id = %claims.subject_id, role = %claims.role, "Role gate rejected request");
        return Err(ServiceError::Forbidden("Access denied for your user type".to_string()).into());
    }
    Ok(next.run(request).await)
}

/// Role gate for company-side routes
pub async fn require_business(request: Request<Body>, next: Next) -> Result<Response, ApiError> {
    require_role(&[AccountRole::Company, AccountRole::Wholesaler], request, next).await
}

/// Role gate for service-provider routes
pub async fn require_service_provider(
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    require_role(&[AccountRole::ServiceProvider], request, next).await
}

/// Extractor for the claims attached by [`auth_middleware`]
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Claims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Claims>().cloned().ok_or_else(missing_token)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Subject {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Subject>().cloned().ok_or_else(missing_token)
    }
}

/// POST /api/auth/signup - JSON body, or multipart with `data` and an optional `logo`
pub async fn signup(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
) -> Result<Reply<AuthSession>, ApiError> {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/"))
        .unwrap_or(false);

    let (req, logo) = if is_multipart {
        let multipart = Multipart::from_request(request, &state).await?;
        let mut form = read_form(multipart).await?;

        let data = form
            .data()
            .ok_or_else(|| ApiError::bad_request("Missing data field in multipart form"))?;
        let req: SignupRequest = serde_json::from_str(data)
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON in data field: {}", e)))?;
        (req, form.take_file("logo"))
    } else {
        let Json(req) = Json::<SignupRequest>::from_request(request, &state).await?;
        (req, None)
    };

    validate_signup(&req)?;

    let session = state.accounts.signup(req, logo).await?;
    Ok(Reply::created("User created successfully", session))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Reply<AuthSession>, ApiError> {
    let Json(request) = body?;
    let session = state
        .accounts
        .login(&request.email, &request.password)
        .await?;
    Ok(Reply::ok("Login successful", session))
}

/// POST /api/auth/google - upsert by email from a provider-asserted identity
pub async fn google_login(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ExternalIdentity>, JsonRejection>,
) -> Result<Reply<AuthSession>, ApiError> {
    let Json(identity) = body?;
    let session = state.accounts.upsert_external(identity).await?;
    Ok(Reply::ok("Login successful", session))
}

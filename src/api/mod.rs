pub mod auth;
mod branches;
mod company;
pub mod envelope;
pub mod error;
pub mod metrics;
mod multipart;
mod profile;
mod uploads;
pub mod validation;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/google", post(auth::google_login));

    let prefix = format!("/{}", state.config.storage.public_prefix.trim_matches('/'));
    let upload_routes = Router::new()
        .route(&format!("{}/:filename", prefix), get(uploads::serve_upload))
        .route(
            &format!("{}/:folder/:filename", prefix),
            get(uploads::serve_folder_upload),
        );

    let business_routes = Router::new()
        .route("/company/logo", post(profile::upload_logo))
        .route_layer(middleware::from_fn(auth::require_business));

    let provider_routes = Router::new()
        .route("/service-provider/photo", post(profile::upload_photo))
        .route(
            "/service-provider/availability",
            post(profile::update_availability),
        )
        .route_layer(middleware::from_fn(auth::require_service_provider));

    // Protected API routes
    let api_routes = Router::new()
        // Profile
        .route("/users/profile", get(profile::get_profile))
        .route("/users/profile", put(profile::update_profile))
        .route("/users/location", put(profile::update_location))
        .route("/users", delete(profile::delete_account))
        // Company
        .route("/company/data", get(company::get_company_data))
        // Branches
        .route("/company/branches", post(branches::create_branch))
        .route("/company/branches", get(branches::list_branches))
        .route("/company/branches/:id", put(branches::update_branch))
        .route("/company/branches/:id", delete(branches::delete_branch))
        .route(
            "/companies/:id/branches",
            get(branches::list_company_branches),
        )
        .merge(business_routes)
        .merge(provider_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    // Authenticated by subject only
    let subject_routes = Router::new()
        .route("/company/data", put(company::update_company_data))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::subject_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics::metrics_endpoint))
        .nest("/api/auth", auth_routes)
        .nest("/api", api_routes.merge(subject_routes))
        .merge(upload_routes)
        .layer(DefaultBodyLimit::max(state.config.storage.max_upload_bytes))
        .layer(middleware::from_fn(metrics::metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

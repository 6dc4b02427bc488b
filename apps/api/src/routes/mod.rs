pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::accounts::handlers as accounts;
use crate::compliance::handlers as compliance;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(health::health_handler))
        .route("/health", get(health::health_handler))
        // Public API
        .route("/api/v1/unauth/login", post(accounts::handle_login))
        .route(
            "/api/v1/unauth/pdf_compliance_scan",
            post(compliance::handle_pdf_compliance_scan),
        )
        // Authenticated API
        .route(
            "/api/v1/auth/compliance_scan",
            post(compliance::handle_compliance_scan),
        )
        .route("/api/v1/auth/me", get(accounts::handle_me))
        .route("/api/v1/auth/users", get(accounts::handle_list_users))
        .route("/api/v1/auth/users/:id", get(accounts::handle_get_user))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

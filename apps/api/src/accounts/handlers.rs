use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::accounts::auth::{issue_token, verify_password, CurrentUser, SuperUser};
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    MAX_PAGE_SIZE
}

/// POST /api/v1/unauth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = state
        .users
        .find_by_username(&req.username)
        .await?
        .filter(|u| verify_password(&req.password, &u.hashed_password))
        .ok_or_else(|| AppError::Validation("Incorrect username or password".to_string()))?;

    if !user.is_active {
        return Err(AppError::Validation("Inactive user".to_string()));
    }

    let access_token = issue_token(
        user.id,
        &state.config.jwt_secret,
        state.config.access_token_expire_minutes,
    )?;
    info!("User {} logged in", user.id);

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}

/// GET /api/v1/auth/me
pub async fn handle_me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// GET /api/v1/auth/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    SuperUser(admin): SuperUser,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<User>>, AppError> {
    let skip = page.skip.max(0);
    let limit = page.limit.clamp(0, MAX_PAGE_SIZE);
    info!("User {} listing users (skip {skip}, limit {limit})", admin.id);
    Ok(Json(state.users.list(skip, limit).await?))
}

/// GET /api/v1/auth/users/:id
pub async fn handle_get_user(
    State(state): State<AppState>,
    SuperUser(admin): SuperUser,
    Path(id): Path<i64>,
) -> Result<Json<User>, AppError> {
    info!("User {} looking up user {id}", admin.id);
    state
        .users
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            AppError::NotFound("The user with this id does not exist in the system".to_string())
        })
}

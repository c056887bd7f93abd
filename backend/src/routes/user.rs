//! `user.*` procedures
//!
//! Thin HTTP adapters over [`UserService`]: decode the input, call the
//! service, encode the result.
//!
//! # Performance Optimizations
//!
//! - Uses pre-computed JWT keys from AppState (no per-request allocation)
//! - Password hashing runs on blocking thread pool (doesn't block async runtime)

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::UserService;
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use signgate_shared::{
    AuthResponse, CheckUniqueQuery, CheckUniqueResponse, PublicUser, SignInRequest, SignUpRequest,
};

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user.signIn", post(sign_in))
        .route("/user.signUp", post(sign_up))
        .route("/user.checkUnique", get(check_unique))
        .route("/user.me", get(me))
}

/// Sign in with username or email
///
/// POST /api/v1/user.signIn
async fn sign_in(
    State(state): State<AppState>,
    body: Result<Json<SignInRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = body?;
    let response = UserService::sign_in(state.users(), state.jwt(), req).await?;
    Ok(Json(response))
}

/// Register a new user
///
/// POST /api/v1/user.signUp
async fn sign_up(
    State(state): State<AppState>,
    body: Result<Json<SignUpRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(req) = body?;
    let response = UserService::sign_up(state.users(), state.jwt(), req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Live availability check for the sign-up form
///
/// GET /api/v1/user.checkUnique?username=..&email=..
async fn check_unique(
    State(state): State<AppState>,
    query: Result<Query<CheckUniqueQuery>, QueryRejection>,
) -> ApiResult<Json<CheckUniqueResponse>> {
    let Query(query) = query?;
    let response = UserService::check_unique(state.users(), query).await?;
    Ok(Json(response))
}

/// Current user (requires authentication)
///
/// GET /api/v1/user.me
async fn me(State(state): State<AppState>, auth_user: AuthUser) -> ApiResult<Json<PublicUser>> {
    let user = UserService::current_user(state.users(), auth_user.user_id).await?;
    Ok(Json(user))
}

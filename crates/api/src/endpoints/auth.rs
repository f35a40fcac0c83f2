//! Signup and token login.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::Deserialize;
use yatube_common::AppResult;
use yatube_core::CreateUserInput;

use crate::{
    middleware::AppState,
    response::ApiResponse,
    views::{LoginView, TokenView},
};

/// Password login body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `?next=` on the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

async fn signup(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> AppResult<ApiResponse<TokenView>> {
    let user = state.user_service.create(input).await?;
    let (user, token) = state.user_service.ensure_token(user).await?;

    Ok(ApiResponse::ok(TokenView {
        id: user.id,
        username: user.username,
        token,
    }))
}

async fn login_page(Query(query): Query<LoginQuery>) -> Json<LoginView> {
    Json(LoginView { next: query.next })
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<TokenView>> {
    let user = state
        .user_service
        .authenticate(&req.username, &req.password)
        .await?;
    let (user, token) = state.user_service.ensure_token(user).await?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(ApiResponse::ok(TokenView {
        id: user.id,
        username: user.username,
        token,
    }))
}

/// Create the auth routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/signup/", post(signup))
        .route("/auth/login/", get(login_page).post(login))
}

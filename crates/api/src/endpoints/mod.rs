//! Route handlers.

pub mod about;
pub mod admin;
pub mod auth;
pub mod posts;
pub mod profile;

use axum::{Router, http::Uri};
use yatube_common::AppError;

use crate::middleware::AppState;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No page at {}", uri.path()))
}

/// Create the router with every page.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(posts::router())
        .merge(profile::router())
        .merge(auth::router())
        .merge(admin::router())
        .merge(about::router())
        .fallback(not_found)
}

//! API response types.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Empty success response.
#[must_use]
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// `302 Found` pointing at `location`.
#[must_use]
pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Path of a user's profile page.
#[must_use]
pub fn profile_path(username: &str) -> String {
    format!("/{}/", urlencoding::encode(username))
}

/// Path of a single post page.
#[must_use]
pub fn post_path(username: &str, post_id: &str) -> String {
    format!(
        "/{}/{}/",
        urlencoding::encode(username),
        urlencoding::encode(post_id)
    )
}

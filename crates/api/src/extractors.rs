//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use yatube_common::AppError;
use yatube_db::entities::user;

use crate::{middleware::AppState, response};

/// Rejection for pages that need a logged-in user.
///
/// Sends the client to the login page with the original path in `next`.
#[derive(Debug, Clone)]
pub struct LoginRedirect {
    location: String,
}

impl LoginRedirect {
    /// Build a redirect to `login_url` that comes back to `next` afterwards.
    #[must_use]
    pub fn new(login_url: &str, next: &str) -> Self {
        let separator = if login_url.contains('?') { '&' } else { '?' };
        Self {
            location: format!("{login_url}{separator}next={}", urlencoding::encode(next)),
        }
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    fn from_parts(parts: &Parts, state: &AppState) -> Self {
        let next = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
        Self::new(&state.login_url, next)
    }
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        response::redirect(&self.location)
    }
}

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = LoginRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Set by auth middleware
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| LoginRedirect::from_parts(parts, state))
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<user::Model>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<user::Model>().cloned()))
    }
}

/// Authenticated administrator extractor.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        if !user.is_admin {
            return Err(AppError::Forbidden("Administrator access required".to_string())
                .into_response());
        }

        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_encodes_next() {
        let redirect = LoginRedirect::new("/auth/login/", "/new/");
        assert_eq!(redirect.location(), "/auth/login/?next=%2Fnew%2F");
    }

    #[test]
    fn test_login_redirect_keeps_query_in_next() {
        let redirect = LoginRedirect::new("/auth/login/", "/follow/?page=2");
        assert_eq!(
            redirect.location(),
            "/auth/login/?next=%2Ffollow%2F%3Fpage%3D2"
        );
    }

    #[test]
    fn test_login_redirect_appends_to_existing_query() {
        let redirect = LoginRedirect::new("/login?lang=en", "/new/");
        assert_eq!(redirect.location(), "/login?lang=en&next=%2Fnew%2F");
    }
}

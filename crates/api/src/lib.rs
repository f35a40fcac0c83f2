//! HTTP layer for yatube-rs.
//!
//! - **Endpoints**: the page routes, plus signup/login and admin actions
//! - **Extractors**: the requesting user, with login redirects for anonymous access
//! - **Middleware**: bearer-token authentication and application state
//! - **Views**: JSON view models handed to the presentation layer
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod views;

use axum::Router;

pub use endpoints::router;
pub use middleware::AppState;

/// The full application: routes, auth middleware and state.
pub fn app(state: AppState) -> Router {
    router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state)
}

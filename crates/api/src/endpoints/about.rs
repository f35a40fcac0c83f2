//! Static pages.

use axum::{Json, Router, routing::get};

use crate::{middleware::AppState, views::AboutView};

async fn author() -> Json<AboutView> {
    Json(AboutView {
        page: "author",
        title: "About the author",
    })
}

async fn tech() -> Json<AboutView> {
    Json(AboutView {
        page: "tech",
        title: "Technologies",
    })
}

/// Create the static page routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about/author/", get(author))
        .route("/about/tech/", get(tech))
}

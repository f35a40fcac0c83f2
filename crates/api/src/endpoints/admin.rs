//! Administrator actions.

use axum::{
    Json, Router,
    extract::State,
    response::Response,
    routing::post,
};
use yatube_common::AppResult;
use yatube_core::CreateGroupInput;

use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
    views::GroupView,
};

async fn create_group(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateGroupInput>,
) -> AppResult<ApiResponse<GroupView>> {
    let group = state.group_service.create(input).await?;
    tracing::info!(group_id = %group.id, admin_id = %admin.id, "Group created by admin");
    Ok(ApiResponse::ok(group.into()))
}

/// Drop every cached index page.
async fn clear_cache(AdminUser(admin): AdminUser, State(state): State<AppState>) -> Response {
    state.index_cache.clear().await;
    tracing::info!(admin_id = %admin.id, "Index cache cleared");
    no_content()
}

/// Create the admin routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/groups/", post(create_group))
        .route("/admin/cache/clear/", post(clear_cache))
}

//! Profiles, the follow feed, and follow/unfollow actions.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::Response,
    routing::get,
};
use yatube_common::AppResult;

use super::posts::PageQuery;
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{profile_path, redirect},
    views::{IndexView, ProfileView},
};

async fn profile(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ProfileView>> {
    let viewer_id = viewer.as_ref().map(|u| u.id.as_str());
    let profile = state
        .listing_service
        .profile(&username, viewer_id, query.page.as_deref())
        .await?;
    Ok(Json(ProfileView::new(profile, &state.post_service)))
}

async fn follow_index(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<IndexView>> {
    let page = state
        .listing_service
        .follow_feed(&user.id, query.page.as_deref())
        .await?;
    Ok(Json(IndexView::new(page, &state.post_service)))
}

async fn profile_follow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Response> {
    state.follow_service.follow(&user.id, &username).await?;
    Ok(redirect(&profile_path(&username)))
}

async fn profile_unfollow(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Response> {
    state.follow_service.unfollow(&user.id, &username).await?;
    Ok(redirect(&profile_path(&username)))
}

/// Create the profile routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/follow/", get(follow_index))
        .route("/{username}/", get(profile))
        .route("/{username}/follow/", get(profile_follow))
        .route("/{username}/unfollow/", get(profile_unfollow))
}

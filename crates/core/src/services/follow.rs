//! Follow service.

use sea_orm::Set;
use yatube_common::{AppResult, IdGenerator};
use yatube_db::{
    entities::follow,
    repositories::{FollowRepository, UserRepository},
};

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Make `user_id` follow `username`.
    ///
    /// Following yourself or someone you already follow does nothing.
    /// Returns whether a new edge was created.
    pub async fn follow(&self, user_id: &str, username: &str) -> AppResult<bool> {
        let author = self.user_repo.get_by_username(username).await?;

        if author.id == user_id {
            tracing::debug!(user_id = %user_id, "Self-follow ignored");
            return Ok(false);
        }

        let model = follow::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            author_id: Set(author.id.clone()),
            created_at: Set(chrono::Utc::now().into()),
        };

        match self.follow_repo.create_if_absent(model).await? {
            Some(_) => {
                tracing::info!(user_id = %user_id, author_id = %author.id, "Follow created");
                Ok(true)
            }
            None => {
                tracing::debug!(user_id = %user_id, author_id = %author.id, "Already following");
                Ok(false)
            }
        }
    }

    /// Make `user_id` stop following `username`.
    ///
    /// Returns whether an edge was removed.
    pub async fn unfollow(&self, user_id: &str, username: &str) -> AppResult<bool> {
        let author = self.user_repo.get_by_username(username).await?;
        let removed = self.follow_repo.delete_by_pair(user_id, &author.id).await?;

        if removed {
            tracing::info!(user_id = %user_id, author_id = %author.id, "Follow removed");
        } else {
            tracing::debug!(user_id = %user_id, author_id = %author.id, "Not following, nothing to remove");
        }
        Ok(removed)
    }
}
